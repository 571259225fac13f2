use std::collections::VecDeque;

use super::ops::{EditOutcome, Editor};
use crate::document::CursorPosition;
use crate::error::EditError;
use crate::search::SearchOptions;

/// Input events an editing surface feeds the engine.
///
/// Every gesture acts at the editor's current caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Split the line at the caret
    Enter,
    /// Delete backward, merging lines at a line start
    Backspace,
    /// Delete forward, merging lines at a line end
    Delete,
    /// Paste text, possibly spanning lines
    Paste(String),
    /// Type text without line breaks
    InsertText(String),
    /// Insert an empty fenced code block with an optional language
    InsertCodeBlock(Option<String>),
    /// Set the caret line's heading level (0 clears it)
    SetHeadingLevel(u8),
    /// Move the caret to a raw position
    MoveCursor(CursorPosition),
    /// Place the caret from a rendered offset
    Focus { line: usize, rendered_offset: usize },
    /// Replace every match in the document
    ReplaceAll {
        query: String,
        replacement: String,
        options: SearchOptions,
    },
}

/// Apply one event to completion.
///
/// # Errors
/// Returns the operation's [`EditError`]; the document is untouched then.
pub fn update(editor: &mut Editor, event: EditEvent) -> Result<EditOutcome, EditError> {
    let at = editor.cursor();
    match event {
        EditEvent::Enter => editor.split(at),
        EditEvent::Backspace => editor.backspace(at),
        EditEvent::Delete => editor.delete(at),
        EditEvent::Paste(text) => editor.paste(at, &text),
        EditEvent::InsertText(text) => editor.insert_text(at, &text),
        EditEvent::InsertCodeBlock(language) => editor.insert_code_block(at, language.as_deref()),
        EditEvent::SetHeadingLevel(level) => editor.set_heading_level(at, level),
        EditEvent::MoveCursor(to) => editor.move_cursor(to),
        EditEvent::Focus {
            line,
            rendered_offset,
        } => editor.focus(line, rendered_offset),
        EditEvent::ReplaceAll {
            query,
            replacement,
            options,
        } => editor.replace_all(&query, &replacement, &options),
    }
}

/// FIFO of pending events. Events that arrive while one is being applied
/// wait here; nothing preempts an edit in progress.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<EditEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply the oldest event, if any.
    pub fn process_next(&mut self, editor: &mut Editor) -> Option<Result<EditOutcome, EditError>> {
        let event = self.pending.pop_front()?;
        Some(update(editor, event))
    }

    /// Apply every pending event in order. A failing event is logged and
    /// skipped; the rest still run. Returns the outcomes of the events that
    /// succeeded.
    pub fn drain(&mut self, editor: &mut Editor) -> Vec<EditOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(event) = self.pending.pop_front() {
            let label = format!("{event:?}");
            match update(editor, event) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => tracing::warn!(event = %label, %err, "edit event rejected"),
            }
        }
        outcomes
    }
}

impl Extend<EditEvent> for EventQueue {
    fn extend<T: IntoIterator<Item = EditEvent>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}
