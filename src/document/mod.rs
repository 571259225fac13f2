//! The document store: an ordered sequence of lines, each holding its raw
//! markdown, the markup last rendered for it, and whether it is being edited.
//!
//! This module handles:
//! - Loading text into lines and joining them back without loss
//! - Structural mutation (replace, splice) with index renumbering
//! - Targeted re-rendering of line ranges through the batch renderer

mod persist;
mod types;

use std::ops::Range;
use std::sync::Arc;

pub use persist::{MemoryStore, Persistence};
pub use types::{CursorPosition, EditorContext, Line};
pub(crate) use types::split_at_char;

use crate::error::EditError;
use crate::render::{RenderOptions, RenderRequest, render_batch_with};

/// The single source of truth for line content. All access is by index.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<Line>,
    context: EditorContext,
    options: RenderOptions,
}

impl Document {
    /// Load text with default render options.
    pub fn load(text: &str) -> Self {
        Self::load_with(text, RenderOptions::default())
    }

    /// Split `text` on `\n` into lines, strip trailing whitespace from each,
    /// and render everything.
    pub fn load_with(text: &str, options: RenderOptions) -> Self {
        let _scope = crate::perf::scope("document.load");
        let lines = text
            .split('\n')
            .enumerate()
            .map(|(index, raw)| Line::new(index, raw.trim_end().to_string()))
            .collect();
        let mut document = Self {
            lines,
            context: EditorContext::default(),
            options,
        };
        document.render_range(0..document.line_count());
        document
    }

    /// Load the document a [`Persistence`] collaborator supplies.
    ///
    /// # Errors
    /// Propagates the collaborator's load error.
    pub fn open<P: Persistence>(store: &mut P, options: RenderOptions) -> Result<Self, P::Error> {
        let text = store.load()?;
        Ok(Self::load_with(&text, options))
    }

    /// Hand the joined text to `store` and mark the document clean.
    ///
    /// # Errors
    /// Propagates the collaborator's save error; the document stays dirty.
    pub fn save<P: Persistence>(&mut self, store: &mut P) -> Result<(), P::Error> {
        store.save(&self.content())?;
        self.context.mark_clean();
        Ok(())
    }

    /// The document text: raw lines joined with `\n`.
    pub fn content(&self) -> String {
        self.lines.iter().map(Line::raw).collect::<Vec<_>>().join("\n")
    }

    /// Number of lines. A document always has at least one.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Immutable copy of every raw line, shared by the requests of one render.
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        Arc::new(self.lines.iter().map(|l| l.raw.clone()).collect())
    }

    pub const fn context(&self) -> &EditorContext {
        &self.context
    }

    pub const fn context_mut(&mut self) -> &mut EditorContext {
        &mut self.context
    }

    pub const fn is_dirty(&self) -> bool {
        self.context.is_dirty()
    }

    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Index of the line currently rendered for editing, if any.
    pub fn editing_line(&self) -> Option<usize> {
        self.lines.iter().position(Line::is_editing)
    }

    /// Switch `index` to editing mode (markers visible) and every other
    /// line out of it, re-rendering the lines that changed.
    ///
    /// # Errors
    /// Returns [`EditError::LineOutOfRange`] if `index` is not a line.
    pub fn begin_editing(&mut self, index: usize) -> Result<(), EditError> {
        self.check_line(index)?;
        let changed = self.set_editing(Some(index));
        self.render_indices(&changed);
        Ok(())
    }

    /// Leave editing mode; the line renders with markers hidden again.
    pub fn end_editing(&mut self) {
        let changed = self.set_editing(None);
        self.render_indices(&changed);
    }

    /// Re-render `range` (clamped to the document) in one batch.
    pub fn render_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.lines.len());
        let indices: Vec<usize> = (range.start.min(end)..end).collect();
        self.render_indices(&indices);
    }

    /// Re-render from `start` to the last line. Used after any edit that
    /// may move a fence.
    pub fn render_from(&mut self, start: usize) -> Range<usize> {
        let range = start.min(self.lines.len())..self.lines.len();
        self.render_range(range.clone());
        range
    }

    pub(crate) fn render_indices(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        let requests: Vec<RenderRequest> = indices
            .iter()
            .filter(|&&i| i < self.lines.len())
            .map(|&i| RenderRequest::new(i, Arc::clone(&snapshot), self.lines[i].is_editing))
            .collect();
        let results = render_batch_with(&requests, &self.options);
        for (request, result) in requests.iter().zip(results) {
            let line = &mut self.lines[request.line_index];
            line.rendered = result.html;
            line.is_block_boundary = result.is_block_boundary;
        }
    }

    pub(crate) fn check_line(&self, index: usize) -> Result<&Line, EditError> {
        self.lines.get(index).ok_or(EditError::LineOutOfRange {
            index,
            len: self.lines.len(),
        })
    }

    /// Overwrite one line's raw text. Its render cache is stale until the
    /// caller re-renders.
    pub(crate) fn set_raw(&mut self, index: usize, raw: String) {
        self.lines[index].raw = raw;
        self.context.mark_dirty();
    }

    /// Replace the lines in `range` with `raws` and renumber everything after.
    pub(crate) fn splice(&mut self, range: Range<usize>, raws: Vec<String>) {
        let start = range.start;
        let inserted = raws.into_iter().map(|raw| Line::new(start, raw));
        self.lines.splice(range, inserted);
        if self.lines.is_empty() {
            self.lines.push(Line::new(0, String::new()));
        }
        self.renumber(start);
        self.context.mark_dirty();
    }

    /// Swap in a whole new set of lines, keeping the editing line if it
    /// still exists. Lines are taken verbatim.
    pub(crate) fn replace_lines(&mut self, raws: Vec<String>) {
        let editing = self.editing_line();
        let len = self.lines.len();
        self.splice(0..len, raws);
        if let Some(index) = editing.filter(|&i| i < self.lines.len()) {
            self.lines[index].is_editing = true;
        }
    }

    /// Make `index` the only editing line; returns lines whose flag flipped.
    pub(crate) fn set_editing(&mut self, index: Option<usize>) -> Vec<usize> {
        let mut changed = Vec::new();
        for line in &mut self.lines {
            let editing = Some(line.index) == index;
            if line.is_editing != editing {
                line.is_editing = editing;
                changed.push(line.index);
            }
        }
        changed
    }

    fn renumber(&mut self, from: usize) {
        for (index, line) in self.lines.iter_mut().enumerate().skip(from) {
            line.index = index;
        }
        self.debug_check_invariants();
    }

    fn debug_check_invariants(&self) {
        debug_assert!(!self.lines.is_empty(), "document must keep at least one line");
        debug_assert!(
            self.lines.iter().enumerate().all(|(i, l)| l.index == i),
            "line indices out of sync with positions"
        );
        debug_assert!(
            self.lines.iter().filter(|l| l.is_editing).count() <= 1,
            "more than one editing line"
        );
    }
}
