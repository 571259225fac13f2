//! Math typesetting boundary.
//!
//! Typesetting itself is a collaborator behind [`MathTypesetter`]. The core
//! only finds expressions, hands them over, and falls back to the delimited
//! source when the collaborator fails.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MathError;
use crate::render::escape_html;

/// `$expr$` with no whitespace just inside the dollars.
static INLINE_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^\s$](?:[^$]*[^\s$])?)\$").expect("inline math regex"));
static CODE_ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<code[^>]*>.*?</code>").expect("code element regex"));

/// Turns a TeX expression into markup.
pub trait MathTypesetter {
    /// Typeset `expression` (without delimiters). `display` is true for block
    /// math and false for inline math.
    ///
    /// # Errors
    /// Returns [`MathError::Typeset`] if the expression cannot be typeset.
    fn typeset(&self, expression: &str, display: bool) -> Result<String, MathError>;
}

/// Wraps the escaped TeX in a span for a client-side typesetter to pick up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapedTypesetter;

impl MathTypesetter for EscapedTypesetter {
    fn typeset(&self, expression: &str, display: bool) -> Result<String, MathError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(MathError::Typeset("empty expression".to_string()));
        }
        let mode = if display { "display" } else { "inline" };
        Ok(format!(
            "<span class=\"math math-{mode}\">{}</span>",
            escape_html(expression)
        ))
    }
}

/// The expression with its source delimiters put back.
pub fn delimited(expression: &str, display: bool) -> String {
    if display {
        format!("$${expression}$$")
    } else {
        format!("${expression}$")
    }
}

/// Typeset, or on failure log and return the escaped delimited source.
pub fn typeset_or_raw(
    typesetter: &dyn MathTypesetter,
    expression: &str,
    display_mode: bool,
) -> String {
    match typesetter.typeset(expression, display_mode) {
        Ok(markup) => markup,
        Err(err) => {
            tracing::warn!(%err, display_mode, "math typesetting failed, showing source");
            crate::perf::log_event("math.degraded", err.to_string());
            escape_html(&delimited(expression, display_mode))
        }
    }
}

/// Typeset `$...$` spans in rendered line markup, leaving `<code>` elements
/// alone. A closing `$` directly followed by a digit does not close a span,
/// so prices like `$5 and $6` stay text.
pub fn typeset_inline(html: &str, typesetter: &dyn MathTypesetter) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for code in CODE_ELEMENT_RE.find_iter(html) {
        out.push_str(&typeset_text(&html[last..code.start()], typesetter));
        out.push_str(code.as_str());
        last = code.end();
    }
    out.push_str(&typeset_text(&html[last..], typesetter));
    out
}

fn typeset_text(text: &str, typesetter: &dyn MathTypesetter) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search_from = 0;
    while let Some(caps) = INLINE_MATH_RE.captures_at(text, search_from) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            // retry from the closing dollar
            search_from = whole.end() - 1;
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        let expression = html_escape::decode_html_entities(expr.as_str());
        out.push_str(&typeset_or_raw(typesetter, &expression, false));
        last = whole.end();
        search_from = last;
    }
    out.push_str(&text[last..]);
    out
}
