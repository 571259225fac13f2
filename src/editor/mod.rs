//! Editing on top of the document store.
//!
//! - [`cursor`]: caret translation between rendered and raw offsets
//! - [`ops`]: split, merge, paste and structural insertions
//! - [`event`]: input events and the queue that applies them one at a time

mod cursor;
mod event;
mod ops;

pub use cursor::{
    CaretError, CaretSurface, CursorTranslator, raw_to_rendered, rendered_to_raw, visible_len,
    visible_text,
};
pub use event::{EditEvent, EventQueue, update};
pub use ops::{EditOutcome, Editor};
