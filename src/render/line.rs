//! Single-line rendering: block markers first, then structural forms.

use once_cell::sync::Lazy;
use regex::Regex;

use super::block::{BlockContext, LineContext, detect_line};
use super::inline::{escape_html, render_inline, render_inline_with_markers};
use super::{RenderOptions, RenderRequest, RenderResult, guarded};
use crate::error::RenderError;

static LANG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```([^\s`]+)?").expect("fence regex"));
static HR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(---+|\*\*\*+|___+)$").expect("rule regex"));
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex"));
static LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([-*+]|\d+\.)\s+(.+)$").expect("list regex"));
static BLOCKQUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>\s*(.+)$").expect("blockquote regex"));

const RULE_GLYPHS: &str = "───────────────────────────────────────";

/// The line-level markdown construct, decided without block context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Structure<'a> {
    Blank,
    Rule,
    Heading { level: usize, text: &'a str },
    ListItem {
        indent: usize,
        marker: &'a str,
        ordered: bool,
        text: &'a str,
    },
    Blockquote { text: &'a str },
    Paragraph,
}

/// Classify a line, first match wins: blank, rule, heading, list item,
/// blockquote, paragraph.
pub fn classify(line: &str) -> Structure<'_> {
    if line.trim().is_empty() {
        return Structure::Blank;
    }
    if HR_RE.is_match(line.trim()) {
        return Structure::Rule;
    }
    if let Some(cap) = HEADER_RE.captures(line) {
        let (Some(hashes), Some(text)) = (cap.get(1), cap.get(2)) else {
            return Structure::Paragraph;
        };
        return Structure::Heading {
            level: hashes.as_str().len(),
            text: text.as_str(),
        };
    }
    if let Some(cap) = LIST_RE.captures(line) {
        let (Some(indent), Some(marker), Some(text)) = (cap.get(1), cap.get(2), cap.get(3)) else {
            return Structure::Paragraph;
        };
        let marker = marker.as_str();
        return Structure::ListItem {
            indent: indent.as_str().chars().count(),
            marker,
            ordered: marker.starts_with(|c: char| c.is_ascii_digit()),
            text: text.as_str(),
        };
    }
    if let Some(text) = BLOCKQUOTE_RE.captures(line).and_then(|cap| cap.get(1)) {
        return Structure::Blockquote {
            text: text.as_str(),
        };
    }
    Structure::Paragraph
}

/// Language tag of an opening code fence, or `""`.
pub fn fence_language(line: &str) -> &str {
    LANG_RE
        .captures(line.trim())
        .and_then(|cap| cap.get(1))
        .map_or("", |m| m.as_str())
}

/// Render one request with default options, never failing.
pub fn render(request: &RenderRequest) -> RenderResult {
    render_with(request, &RenderOptions::default())
}

/// Render one request; any failure degrades to escaped raw text.
pub fn render_with(request: &RenderRequest, options: &RenderOptions) -> RenderResult {
    guarded(&request.line, request.line_index, || {
        try_render(request, options)
    })
}

/// Render one request, reporting requests whose index is not in the document.
///
/// # Errors
/// Returns [`RenderError::LineOutOfRange`] if `line_index` is not a valid
/// index into `all_lines`.
pub fn try_render(
    request: &RenderRequest,
    options: &RenderOptions,
) -> Result<RenderResult, RenderError> {
    let len = request.all_lines.len();
    if request.line_index >= len {
        return Err(RenderError::LineOutOfRange {
            index: request.line_index,
            len,
        });
    }
    let context = detect_line(request.line_index, &request.all_lines);
    Ok(render_in_context(
        &request.line,
        context,
        request.is_editing,
        options,
    ))
}

/// Render `line` once its block context is known.
pub(crate) fn render_in_context(
    line: &str,
    context: LineContext,
    is_editing: bool,
    options: &RenderOptions,
) -> RenderResult {
    if is_editing {
        return RenderResult {
            html: render_editing(line, context),
            is_block_boundary: false,
        };
    }

    if let Some(result) = render_code_block(line, context.code) {
        return result;
    }
    if let Some(result) = render_math_block(line, context.math) {
        return result;
    }

    RenderResult {
        html: render_structure(line, options),
        is_block_boundary: false,
    }
}

/// The line under the caret: visible text is exactly the raw text.
fn render_editing(line: &str, context: LineContext) -> String {
    let class = if context.code.is_boundary() {
        Some("code-fence-editing")
    } else if context.code.in_block {
        Some("code-block-line-editing")
    } else if context.math.is_boundary() {
        Some("math-fence-editing")
    } else if context.math.in_block {
        Some("math-block-line-editing")
    } else {
        None
    };
    match class {
        Some(class) => format!("<span class=\"{class}\">{}</span>", escape_html(line)),
        None if line.is_empty() => "<br>".to_string(),
        None => render_inline_with_markers(line),
    }
}

fn render_code_block(line: &str, code: BlockContext) -> Option<RenderResult> {
    if code.is_start {
        let lang = html_escape::encode_double_quoted_attribute(fence_language(line));
        return Some(boundary(format!(
            "<span class=\"code-block-start\" data-lang=\"{lang}\"></span>"
        )));
    }
    if code.is_end {
        return Some(boundary("<span class=\"code-block-end\"></span>".to_string()));
    }
    code.in_block.then(|| RenderResult {
        html: format!("<code class=\"code-block-line\">{}</code>", escape_html(line)),
        is_block_boundary: false,
    })
}

/// Math lines stay raw; typesetting happens outside the core.
fn render_math_block(line: &str, math: BlockContext) -> Option<RenderResult> {
    if math.is_start {
        return Some(boundary("<span class=\"math-block-start\"></span>".to_string()));
    }
    if math.is_end {
        return Some(boundary("<span class=\"math-block-end\"></span>".to_string()));
    }
    math.in_block.then(|| RenderResult {
        html: format!("<span class=\"math-block-line\">{}</span>", escape_html(line)),
        is_block_boundary: false,
    })
}

const fn boundary(html: String) -> RenderResult {
    RenderResult {
        html,
        is_block_boundary: true,
    }
}

fn render_structure(line: &str, options: &RenderOptions) -> String {
    match classify(line) {
        Structure::Blank => "<br>".to_string(),
        Structure::Rule => format!("<span class=\"hr\">{RULE_GLYPHS}</span>"),
        Structure::Heading { level, text } => {
            format!("<span class=\"heading h{level}\">{}</span>", render_inline(text))
        }
        Structure::ListItem {
            indent,
            marker,
            ordered,
            text,
        } => {
            let (class, shown) = if ordered {
                ("ordered", marker)
            } else {
                ("unordered", "•")
            };
            format!(
                "<span class=\"list-item\" style=\"padding-left: {}px\">\
                 <span class=\"list-marker {class}\">{shown}</span>{}</span>",
                indent * options.list_indent_px,
                render_inline(text)
            )
        }
        Structure::Blockquote { text } => {
            format!("<span class=\"blockquote\">{}</span>", render_inline(text))
        }
        Structure::Paragraph => render_inline(line),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn request(lines: &[&str], index: usize, editing: bool) -> RenderRequest {
        let all: Vec<String> = lines.iter().map(|s| (*s).to_string()).collect();
        RenderRequest::new(index, Arc::new(all), editing)
    }

    fn html(lines: &[&str], index: usize) -> String {
        render(&request(lines, index, false)).html
    }

    #[test]
    fn test_heading_rendering() {
        let result = render(&request(&["## Title"], 0, false));
        assert_eq!(result.html, "<span class=\"heading h2\">Title</span>");
        assert!(!result.is_block_boundary);
    }

    #[test]
    fn test_heading_text_goes_through_inline_renderer() {
        assert_eq!(
            html(&["# Hello **World**"], 0),
            "<span class=\"heading h1\">Hello <strong>World</strong></span>"
        );
    }

    #[test]
    fn test_seven_hashes_is_a_paragraph() {
        assert_eq!(html(&["####### x"], 0), "####### x");
        assert_eq!(html(&["#nospace"], 0), "#nospace");
    }

    #[test]
    fn test_code_block() {
        let doc = ["```rust", "fn main() { *x* }", "```"];
        let start = render(&request(&doc, 0, false));
        assert_eq!(
            start.html,
            "<span class=\"code-block-start\" data-lang=\"rust\"></span>"
        );
        assert!(start.is_block_boundary);

        let inside = render(&request(&doc, 1, false));
        assert_eq!(
            inside.html,
            "<code class=\"code-block-line\">fn main() { *x* }</code>"
        );
        assert!(!inside.is_block_boundary);

        let end = render(&request(&doc, 2, false));
        assert_eq!(end.html, "<span class=\"code-block-end\"></span>");
        assert!(end.is_block_boundary);
    }

    #[test]
    fn test_unterminated_code_fence() {
        let doc = ["```python", "code line"];
        let start = render(&request(&doc, 0, false));
        assert!(start.is_block_boundary);
        assert!(start.html.contains("data-lang=\"python\""));
        assert_eq!(
            html(&doc, 1),
            "<code class=\"code-block-line\">code line</code>"
        );
    }

    #[test]
    fn test_code_line_is_escaped_not_inline_rendered() {
        assert_eq!(
            html(&["```", "<b>**x**</b>"], 1),
            "<code class=\"code-block-line\">&lt;b&gt;**x**&lt;/b&gt;</code>"
        );
    }

    #[test]
    fn test_math_block() {
        let doc = ["$$", "x^2 < y", "$$"];
        assert_eq!(html(&doc, 0), "<span class=\"math-block-start\"></span>");
        assert_eq!(
            html(&doc, 1),
            "<span class=\"math-block-line\">x^2 &lt; y</span>"
        );
        let end = render(&request(&doc, 2, false));
        assert!(end.is_block_boundary);
        assert_eq!(end.html, "<span class=\"math-block-end\"></span>");
    }

    #[test]
    fn test_math_fence_inside_code_block_is_code() {
        let doc = ["```", "$$", "```"];
        let result = render(&request(&doc, 1, false));
        assert_eq!(result.html, "<code class=\"code-block-line\">$$</code>");
        assert!(!result.is_block_boundary);
    }

    #[test]
    fn test_blank_and_rule() {
        assert_eq!(html(&["   "], 0), "<br>");
        assert_eq!(html(&["---"], 0), format!("<span class=\"hr\">{RULE_GLYPHS}</span>"));
        assert_eq!(html(&["*****"], 0), format!("<span class=\"hr\">{RULE_GLYPHS}</span>"));
        assert_eq!(html(&["___"], 0), format!("<span class=\"hr\">{RULE_GLYPHS}</span>"));
        assert_eq!(html(&["--"], 0), "--");
    }

    #[test]
    fn test_unordered_list_item() {
        assert_eq!(
            html(&["  - item *one*"], 0),
            "<span class=\"list-item\" style=\"padding-left: 40px\">\
             <span class=\"list-marker unordered\">•</span>item <em>one</em></span>"
        );
    }

    #[test]
    fn test_ordered_list_item() {
        let out = html(&["12. twelve"], 0);
        assert!(out.contains("list-marker ordered\">12.</span>twelve"));
        assert!(out.contains("padding-left: 0px"));
    }

    #[test]
    fn test_list_indent_follows_options() {
        let options = RenderOptions {
            list_indent_px: 8,
            ..RenderOptions::default()
        };
        let result = render_with(&request(&["\t+ x"], 0, false), &options);
        assert!(result.html.contains("padding-left: 8px"));
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            html(&["> quoted ~~text~~"], 0),
            "<span class=\"blockquote\">quoted <del>text</del></span>"
        );
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(html(&["plain & simple"], 0), "plain &amp; simple");
    }

    #[test]
    fn test_editing_shows_raw_with_markers() {
        let result = render(&request(&["## **Title**"], 0, true));
        assert_eq!(result.html, "## <strong>**Title**</strong>");
        assert!(!result.is_block_boundary);
    }

    #[test]
    fn test_editing_inside_blocks_is_tagged() {
        let doc = ["```js", "a < b", "```", "$$", "x", "$$"];
        let at = |i| render(&request(&doc, i, true)).html;
        assert_eq!(at(0), "<span class=\"code-fence-editing\">```js</span>");
        assert_eq!(at(1), "<span class=\"code-block-line-editing\">a &lt; b</span>");
        assert_eq!(at(3), "<span class=\"math-fence-editing\">$$</span>");
        assert_eq!(at(4), "<span class=\"math-block-line-editing\">x</span>");
    }

    #[test]
    fn test_editing_blank_line() {
        assert_eq!(render(&request(&[""], 0, true)).html, "<br>");
    }

    #[test]
    fn test_out_of_range_request_degrades() {
        let mut req = request(&["a"], 0, false);
        req.line_index = 5;
        req.line = "**raw**".to_string();
        assert!(try_render(&req, &RenderOptions::default()).is_err());
        assert_eq!(render(&req), RenderResult::raw("**raw**"));
    }

    #[test]
    fn test_fence_language_attribute_is_escaped() {
        assert_eq!(fence_language("```c++"), "c++");
        assert_eq!(fence_language("```"), "");
        assert!(html(&["```a\"b"], 0).contains("data-lang=\"a&quot;b\""));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let req = request(&["# a", "```", "b"], 2, false);
        assert_eq!(render(&req), render(&req));
    }
}
