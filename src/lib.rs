// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderResult)
    clippy::module_name_repetitions
)]

//! # Loom
//!
//! A line-oriented markdown editing engine.
//!
//! Loom keeps a document as an ordered sequence of raw lines and renders
//! each line to display markup on demand:
//! - Fenced code and math blocks resolved across lines
//! - Inline emphasis, code spans and links with hidden or visible markers
//! - Parallel batch rendering over one immutable snapshot
//! - Caret translation between rendered and raw offsets
//! - Split, merge, paste and structural edits with targeted re-rendering
//!
//! ## Architecture
//!
//! Edits flow one way: an [`editor::EditEvent`] mutates the
//! [`document::Document`], the affected lines re-render through
//! [`render::render_batch`], and the caret is repositioned in raw
//! coordinates. Events are applied one at a time to completion.
//!
//! ## Modules
//!
//! - [`render`]: Inline, block and line rendering, batch coordination
//! - [`document`]: Line store, editor context, persistence boundary
//! - [`editor`]: Cursor translation, edit operations, event queue
//! - [`math`]: Math typesetting boundary
//! - [`search`]: Search and replace
//! - [`export`]: Whole-document HTML
//! - [`script`]: Text form of edit events
//! - [`config`]: Flag files and defaults

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod math;
pub mod perf;
pub mod render;
pub mod script;
pub mod search;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::document::{CursorPosition, Document, Line};
    pub use crate::editor::{EditEvent, EditOutcome, Editor, EventQueue};
    pub use crate::render::{RenderRequest, RenderResult, render, render_batch};
}
