//! Core document types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One line of the document: authoritative raw text plus its render cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Always equal to the line's position in the document.
    pub(crate) index: usize,
    pub(crate) raw: String,
    /// Valid until the next mutation of this line or of a fence above it.
    pub(crate) rendered: String,
    pub(crate) is_block_boundary: bool,
    pub(crate) is_editing: bool,
}

impl Line {
    pub(crate) const fn new(index: usize, raw: String) -> Self {
        Self {
            index,
            raw,
            rendered: String::new(),
            is_block_boundary: false,
            is_editing: false,
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub const fn is_block_boundary(&self) -> bool {
        self.is_block_boundary
    }

    pub const fn is_editing(&self) -> bool {
        self.is_editing
    }

    /// Length of the raw text in characters.
    pub fn char_len(&self) -> usize {
        self.raw.chars().count()
    }
}

/// A caret position. `char_offset` is always in raw-text characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub line_index: usize,
    pub char_offset: usize,
}

impl CursorPosition {
    pub const fn new(line_index: usize, char_offset: usize) -> Self {
        Self {
            line_index,
            char_offset,
        }
    }

    /// Start of `line_index`.
    pub const fn line_start(line_index: usize) -> Self {
        Self::new(line_index, 0)
    }
}

/// Session state for the open document: where it came from and whether it
/// has unsaved changes. Created on open, dropped with the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContext {
    path: Option<PathBuf>,
    dirty: bool,
}

impl EditorContext {
    pub const fn new(path: Option<PathBuf>) -> Self {
        Self { path, dirty: false }
    }

    pub const fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Byte index of the `char_offset`-th character, clamped to the end.
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(i, _)| i)
}

/// Split `text` at a character offset.
pub(crate) fn split_at_char(text: &str, char_offset: usize) -> (&str, &str) {
    text.split_at(byte_index(text, char_offset))
}
