//! Whole-document HTML export.
//!
//! Every line is rendered with markers hidden, whatever the editing state
//! of the live document. The inner lines of a closed math block are joined
//! and typeset once as display math; `$...$` spans elsewhere outside code
//! are typeset inline.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::document::Document;
use crate::math::{MathTypesetter, typeset_inline, typeset_or_raw};
use crate::render::{BlockState, LineContext, RenderRequest, RenderResult, render_batch_with};

/// Render `document` to a standalone HTML fragment.
pub fn to_html(document: &Document, typesetter: &dyn MathTypesetter) -> String {
    let _scope = crate::perf::scope("export.to_html");
    let snapshot = document.snapshot();
    let requests: Vec<RenderRequest> = (0..snapshot.len())
        .map(|i| RenderRequest::new(i, Arc::clone(&snapshot), false))
        .collect();
    let results = render_batch_with(&requests, document.options());

    let mut state = BlockState::default();
    let contexts: Vec<LineContext> = snapshot.iter().map(|line| state.advance(line)).collect();

    let mut out = String::from("<div class=\"document\">\n");
    let mut index = 0;
    while index < snapshot.len() {
        if let Some(end) = closed_math_block(&contexts, index) {
            push_line(&mut out, index, &results[index].html);
            let body = snapshot[index + 1..end].join("\n");
            if index + 1 < end {
                let markup = typeset_or_raw(typesetter, &body, true);
                let _ = writeln!(
                    out,
                    "<div class=\"math-block\" data-line=\"{}\">{markup}</div>",
                    index + 1
                );
            }
            push_line(&mut out, end, &results[end].html);
            index = end + 1;
            continue;
        }
        push_line(&mut out, index, &line_markup(&results[index], contexts[index], typesetter));
        index += 1;
    }
    out.push_str("</div>\n");
    out
}

/// Index of the closing fence if `start` opens a math block that closes
/// with no code block involvement in between.
fn closed_math_block(contexts: &[LineContext], start: usize) -> Option<usize> {
    let touches_code = |c: &LineContext| c.code.in_block || c.code.is_boundary();
    let opening = contexts[start];
    if !opening.math.is_start || touches_code(&opening) {
        return None;
    }
    let end = contexts[start + 1..]
        .iter()
        .position(|c| c.math.is_end)
        .map(|offset| start + 1 + offset)?;
    (!contexts[start..=end].iter().any(touches_code)).then_some(end)
}

fn line_markup(result: &RenderResult, context: LineContext, typesetter: &dyn MathTypesetter) -> String {
    let plain = !context.code.in_block
        && !context.math.in_block
        && !result.is_block_boundary;
    if plain {
        typeset_inline(&result.html, typesetter)
    } else {
        result.html.clone()
    }
}

fn push_line(out: &mut String, index: usize, html: &str) {
    let _ = writeln!(out, "<div class=\"line\" data-line=\"{index}\">{html}</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::EscapedTypesetter;

    fn export(text: &str) -> String {
        to_html(&Document::load(text), &EscapedTypesetter)
    }

    #[test]
    fn test_one_div_per_line() {
        let html = export("# Hi\n\ntext");
        assert_eq!(
            html,
            "<div class=\"document\">\n\
             <div class=\"line\" data-line=\"0\"><span class=\"heading h1\">Hi</span></div>\n\
             <div class=\"line\" data-line=\"1\"><br></div>\n\
             <div class=\"line\" data-line=\"2\">text</div>\n\
             </div>\n"
        );
    }

    #[test]
    fn test_closed_math_block_typesets_once() {
        let html = export("$$\na + b\n= c\n$$\nafter");
        assert!(html.contains(
            "<div class=\"math-block\" data-line=\"1\"><span class=\"math math-display\">a + b\n= c</span></div>"
        ));
        assert!(!html.contains("math-block-line"));
        assert!(html.contains("<div class=\"line\" data-line=\"4\">after</div>"));
    }

    #[test]
    fn test_unclosed_math_block_keeps_per_line_markup() {
        let html = export("$$\nx");
        assert!(html.contains("<span class=\"math-block-line\">x</span>"));
        assert!(!html.contains("math-display"));
    }

    #[test]
    fn test_inline_math_skips_code_blocks() {
        let html = export("see $x$\n```\n$y$\n```");
        assert!(html.contains("see <span class=\"math math-inline\">x</span>"));
        assert!(html.contains("<code class=\"code-block-line\">$y$</code>"));
    }

    #[test]
    fn test_export_ignores_editing_state() {
        let mut document = Document::load("**bold**");
        document.begin_editing(0).unwrap();
        let html = to_html(&document, &EscapedTypesetter);
        assert!(html.contains("<strong>bold</strong>"));
    }
}
