//! Per-line markdown rendering.
//!
//! This module handles:
//! - Inline markup (emphasis, code spans, links) in [`inline`]
//! - Fenced code/math block membership in [`block`]
//! - Structural line forms and block markers in [`line`]
//! - Many-line rendering over one document snapshot in [`batch`]

pub mod batch;
pub mod block;
pub mod inline;
pub mod line;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

pub use batch::{render_batch, render_batch_with};
pub use block::{BlockContext, BlockKind, BlockState, LineContext, detect, detect_line};
pub use inline::{MarkerMode, escape_html, render_inline, render_inline_with_markers};
pub use line::{render, render_with, try_render};

/// Batches larger than this fan out across worker threads by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50;
/// Left padding per leading whitespace character of a list item.
pub const DEFAULT_LIST_INDENT_PX: usize = 20;

/// One unit of rendering work.
///
/// `all_lines` is the full document so block context can be resolved from
/// line 0; requests built from the same document share one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub line: String,
    pub line_index: usize,
    pub all_lines: Arc<Vec<String>>,
    pub is_editing: bool,
}

impl RenderRequest {
    /// Request for `all_lines[line_index]`. An index past the end yields an
    /// empty line, which the renderer reports as out of range.
    pub fn new(line_index: usize, all_lines: Arc<Vec<String>>, is_editing: bool) -> Self {
        let line = all_lines.get(line_index).cloned().unwrap_or_default();
        Self {
            line,
            line_index,
            all_lines,
            is_editing,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub html: String,
    /// True exactly when the line rendered as a fence start or end marker.
    pub is_block_boundary: bool,
}

impl RenderResult {
    /// The universal fallback: the raw text, escaped, with no markup.
    pub fn raw(line: &str) -> Self {
        Self {
            html: escape_html(line),
            is_block_boundary: false,
        }
    }
}

/// Knobs shared by single-line and batch rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub parallel_threshold: usize,
    pub list_indent_px: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            list_indent_px: DEFAULT_LIST_INDENT_PX,
        }
    }
}

/// Run one line's render, degrading to escaped raw text on any failure.
///
/// Both the single-line and batch paths go through here so a failing line
/// looks the same either way and never takes its neighbours down with it.
pub(crate) fn guarded(
    line: &str,
    line_index: usize,
    render: impl FnOnce() -> Result<RenderResult, RenderError>,
) -> RenderResult {
    match catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            tracing::warn!(line = line_index, %err, "render degraded to raw text");
            crate::perf::log_event("render.degraded", format!("line={line_index} err={err}"));
            RenderResult::raw(line)
        }
        Err(_) => {
            tracing::warn!(line = line_index, "line renderer panicked; showing raw text");
            crate::perf::log_event("render.panicked", format!("line={line_index}"));
            RenderResult::raw(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new_copies_line_from_snapshot() {
        let snapshot = Arc::new(vec!["a".to_string(), "b".to_string()]);
        let request = RenderRequest::new(1, Arc::clone(&snapshot), true);
        assert_eq!(request.line, "b");
        assert!(request.is_editing);
        assert!(Arc::ptr_eq(&request.all_lines, &snapshot));
    }

    #[test]
    fn test_guarded_degrades_errors_to_raw() {
        let result = guarded("<x>", 3, || {
            Err(RenderError::LineOutOfRange { index: 3, len: 1 })
        });
        assert_eq!(result, RenderResult::raw("<x>"));
        assert_eq!(result.html, "&lt;x&gt;");
    }

    #[test]
    fn test_guarded_degrades_panics_to_raw() {
        let result = guarded("boom", 0, || panic!("renderer bug"));
        assert_eq!(result.html, "boom");
        assert!(!result.is_block_boundary);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let request = RenderRequest::new(0, Arc::new(vec!["# x".to_string()]), false);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"lineIndex\":0"));
        assert!(json.contains("\"allLines\":[\"# x\"]"));
        assert!(json.contains("\"isEditing\":false"));

        let result: RenderResult =
            serde_json::from_str(r#"{"html":"<br>","isBlockBoundary":true}"#).unwrap();
        assert!(result.is_block_boundary);
    }
}
