use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::cursor::CursorTranslator;
use crate::document::{CursorPosition, Document, split_at_char};
use crate::error::EditError;
use crate::render::BlockKind;
use crate::search::{SearchOptions, replace_in_content};

static HEADING_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}(\s+|$)").expect("heading prefix regex"));

/// What an edit did: where the caret ended up and which lines re-rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub cursor: CursorPosition,
    /// Smallest range holding every re-rendered line. Lines strictly inside
    /// it may have kept their markup (a caret jump re-renders only its two
    /// ends). Empty when nothing re-rendered.
    pub rendered: Range<usize>,
}

/// Line-structure edits over a [`Document`].
///
/// Each operation validates its position, mutates the line sequence,
/// renumbers, re-renders the affected range and moves the caret before
/// returning. Nothing is mutated when an operation returns `Err`.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    cursor: CursorPosition,
}

impl Editor {
    pub const fn new(document: Document) -> Self {
        Self {
            document,
            cursor: CursorPosition::new(0, 0),
        }
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// The caret, in raw coordinates.
    pub const fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    /// Move the caret, clamping the offset to the line, and put that line
    /// in editing mode. The old and new editing lines re-render; the
    /// outcome spans both.
    ///
    /// # Errors
    /// Returns [`EditError::LineOutOfRange`] if the line does not exist.
    pub fn move_cursor(&mut self, to: CursorPosition) -> Result<EditOutcome, EditError> {
        let len = self.document.check_line(to.line_index)?.char_len();
        let cursor = CursorPosition::new(to.line_index, to.char_offset.min(len));
        let previous = self.document.editing_line();
        self.document.begin_editing(cursor.line_index)?;
        let rendered = match previous {
            Some(p) if p == cursor.line_index => empty_range(p),
            Some(p) => covering(cursor.line_index..cursor.line_index + 1, &[p]),
            None => cursor.line_index..cursor.line_index + 1,
        };
        Ok(self.finish("move", cursor, rendered))
    }

    /// Place the caret from a click or surface report in rendered units.
    ///
    /// The offset is measured against the line's current markup, then the
    /// line switches to editing mode where raw and rendered text agree.
    ///
    /// # Errors
    /// Returns [`EditError::LineOutOfRange`] if the line does not exist.
    pub fn focus(&mut self, line_index: usize, rendered_offset: usize) -> Result<EditOutcome, EditError> {
        self.document.check_line(line_index)?;
        let position = CursorTranslator::new(&self.document).to_raw(line_index, rendered_offset);
        self.move_cursor(position)
    }

    /// Enter: split a line at a raw offset. The tail becomes a new editing
    /// line right after it and the caret moves to its start.
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn split(&mut self, at: CursorPosition) -> Result<EditOutcome, EditError> {
        self.check_position(at)?;
        let raw = self.raw(at.line_index);
        let (before, after) = split_at_char(&raw, at.char_offset);
        self.document
            .splice(at.line_index..at.line_index + 1, vec![before.to_string(), after.to_string()]);
        let next = at.line_index + 1;
        let rendered = self.rerender_structural(at.line_index, next);
        Ok(self.finish("split", CursorPosition::line_start(next), rendered))
    }

    /// Backspace at the start of a line: append it to the previous line.
    ///
    /// # Errors
    /// Returns an error if the line does not exist or is the first line.
    pub fn merge_backward(&mut self, line_index: usize) -> Result<EditOutcome, EditError> {
        self.document.check_line(line_index)?;
        if line_index == 0 {
            return Err(EditError::NoNeighbour { line: line_index });
        }
        let previous = line_index - 1;
        let head = self.raw(previous);
        let cursor = CursorPosition::new(previous, head.chars().count());
        let merged = head + &self.raw(line_index);
        self.document.splice(previous..line_index + 1, vec![merged]);
        let rendered = self.rerender_structural(previous, previous);
        Ok(self.finish("merge_backward", cursor, rendered))
    }

    /// Delete at the end of a line: pull the next line up into it. The
    /// caret keeps its offset.
    ///
    /// # Errors
    /// Returns an error if `at` is invalid or on the last line.
    pub fn merge_forward(&mut self, at: CursorPosition) -> Result<EditOutcome, EditError> {
        self.check_position(at)?;
        let next = at.line_index + 1;
        if next >= self.document.line_count() {
            return Err(EditError::NoNeighbour { line: at.line_index });
        }
        let merged = self.raw(at.line_index) + &self.raw(next);
        self.document.splice(at.line_index..next + 1, vec![merged]);
        let rendered = self.rerender_structural(at.line_index, at.line_index);
        Ok(self.finish("merge_forward", at, rendered))
    }

    /// Backspace gesture: delete the character before the caret, merge with
    /// the previous line at offset 0, or do nothing at the document start.
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn backspace(&mut self, at: CursorPosition) -> Result<EditOutcome, EditError> {
        self.check_position(at)?;
        if at.char_offset > 0 {
            let raw = self.raw(at.line_index);
            let (head, tail) = split_at_char(&raw, at.char_offset);
            let (kept, _) = split_at_char(head, at.char_offset - 1);
            let edited = format!("{kept}{tail}");
            let cursor = CursorPosition::new(at.line_index, at.char_offset - 1);
            return Ok(self.apply_line_edit("backspace", at.line_index, edited, cursor));
        }
        if at.line_index > 0 {
            return self.merge_backward(at.line_index);
        }
        Ok(self.finish("backspace", at, empty_range(0)))
    }

    /// Delete gesture: delete the character under the caret, merge the next
    /// line at the end of a line, or do nothing at the document end.
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn delete(&mut self, at: CursorPosition) -> Result<EditOutcome, EditError> {
        let len = self.check_position(at)?;
        if at.char_offset < len {
            let raw = self.raw(at.line_index);
            let (head, tail) = split_at_char(&raw, at.char_offset);
            let (_, rest) = split_at_char(tail, 1);
            let edited = format!("{head}{rest}");
            return Ok(self.apply_line_edit("delete", at.line_index, edited, at));
        }
        if at.line_index + 1 < self.document.line_count() {
            return self.merge_forward(at);
        }
        Ok(self.finish("delete", at, empty_range(at.line_index)))
    }

    /// Insert text without line breaks at the caret (typing, single-line
    /// paste). Text containing line breaks is routed to [`Self::paste`].
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn insert_text(&mut self, at: CursorPosition, text: &str) -> Result<EditOutcome, EditError> {
        if text.contains(['\n', '\r']) {
            return self.paste(at, text);
        }
        self.check_position(at)?;
        let raw = self.raw(at.line_index);
        let (before, after) = split_at_char(&raw, at.char_offset);
        let edited = format!("{before}{text}{after}");
        let cursor = CursorPosition::new(at.line_index, at.char_offset + text.chars().count());
        Ok(self.apply_line_edit("insert", at.line_index, edited, cursor))
    }

    /// Paste at the caret. Multi-line text splits the target line: the first
    /// pasted line joins the head, the last joins the tail and becomes the
    /// editing line, and the caret lands before the tail.
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn paste(&mut self, at: CursorPosition, text: &str) -> Result<EditOutcome, EditError> {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let segments: Vec<&str> = normalized.split('\n').collect();
        let [first, middle @ .., last] = segments.as_slice() else {
            return self.insert_text(at, &normalized);
        };
        self.check_position(at)?;
        let raw = self.raw(at.line_index);
        let (before, after) = split_at_char(&raw, at.char_offset);

        let mut lines = Vec::with_capacity(segments.len());
        lines.push(format!("{before}{first}"));
        lines.extend(middle.iter().map(|s| (*s).to_string()));
        lines.push(format!("{last}{after}"));

        let last_index = at.line_index + segments.len() - 1;
        self.document.splice(at.line_index..at.line_index + 1, lines);
        let rendered = self.rerender_structural(at.line_index, last_index);
        let cursor = CursorPosition::new(last_index, last.chars().count());
        Ok(self.finish("paste", cursor, rendered))
    }

    /// Insert an empty fenced code block. A blank caret line becomes the
    /// opening fence; otherwise the block goes below it. The caret moves to
    /// the empty body line.
    ///
    /// # Errors
    /// Returns an error if `at` is not a valid position.
    pub fn insert_code_block(
        &mut self,
        at: CursorPosition,
        language: Option<&str>,
    ) -> Result<EditOutcome, EditError> {
        self.check_position(at)?;
        let fence = BlockKind::Code.delimiter();
        let block = vec![
            format!("{fence}{}", language.unwrap_or_default().trim()),
            String::new(),
            fence.to_string(),
        ];
        let first = if self.raw(at.line_index).trim().is_empty() {
            self.document.splice(at.line_index..at.line_index + 1, block);
            at.line_index
        } else {
            let below = at.line_index + 1;
            self.document.splice(below..below, block);
            below
        };
        let body = first + 1;
        let rendered = self.rerender_structural(first.min(at.line_index), body);
        Ok(self.finish("insert_code_block", CursorPosition::line_start(body), rendered))
    }

    /// Rewrite a line's heading prefix: 0 removes it, 1..=6 sets `#`s.
    /// The caret shifts with the prefix and never lands inside it.
    ///
    /// # Errors
    /// Returns an error for levels above 6 or an invalid position.
    pub fn set_heading_level(&mut self, at: CursorPosition, level: u8) -> Result<EditOutcome, EditError> {
        if level > 6 {
            return Err(EditError::InvalidHeadingLevel(level));
        }
        self.check_position(at)?;
        let raw = self.raw(at.line_index);
        let old_prefix = HEADING_PREFIX_RE.find(&raw).map_or(0, |m| m.end());
        let text = &raw[old_prefix..];
        let new_prefix = if level == 0 {
            String::new()
        } else {
            format!("{} ", "#".repeat(usize::from(level)))
        };
        let old_chars = raw[..old_prefix].chars().count();
        let new_chars = new_prefix.chars().count();
        let offset = at.char_offset.saturating_sub(old_chars) + new_chars;
        let edited = format!("{new_prefix}{text}");
        let cursor = CursorPosition::new(at.line_index, offset.min(edited.chars().count()));
        Ok(self.apply_line_edit("set_heading_level", at.line_index, edited, cursor))
    }

    /// Replace every match in the document, reload the lines and re-render
    /// everything. The caret is clamped into the new text.
    ///
    /// # Errors
    /// Returns [`EditError::Search`] for an invalid pattern.
    pub fn replace_all(
        &mut self,
        query: &str,
        replacement: &str,
        options: &SearchOptions,
    ) -> Result<EditOutcome, EditError> {
        let result = replace_in_content(query, replacement, &self.document.content(), options)?;
        if result.replaced_count == 0 {
            return Ok(self.finish("replace_all", self.cursor, empty_range(self.cursor.line_index)));
        }
        self.document
            .replace_lines(result.new_content.split('\n').map(str::to_string).collect());
        let rendered = self.document.render_from(0);
        let last = self.document.line_count() - 1;
        let line_index = self.cursor.line_index.min(last);
        let len = self.document.line(line_index).map_or(0, |l| l.char_len());
        let cursor = CursorPosition::new(line_index, self.cursor.char_offset.min(len));
        tracing::debug!(replaced = result.replaced_count, "replace_all");
        Ok(self.finish("replace_all", cursor, rendered))
    }

    /// Swap one line's raw text. Only that line re-renders unless the edit
    /// created or destroyed a fence, which shifts every line below.
    fn apply_line_edit(
        &mut self,
        operation: &'static str,
        line_index: usize,
        edited: String,
        cursor: CursorPosition,
    ) -> EditOutcome {
        let was = fence_signature(&self.raw(line_index));
        let now = fence_signature(&edited);
        self.document.set_raw(line_index, edited);
        let mut changed = self.document.set_editing(Some(line_index));
        let rendered = if was == now {
            changed.push(line_index);
            self.document.render_indices(&changed);
            covering(line_index..line_index + 1, &changed)
        } else {
            changed.retain(|&i| i < line_index);
            self.document.render_indices(&changed);
            covering(self.document.render_from(line_index), &changed)
        };
        self.finish(operation, cursor, rendered)
    }

    /// Re-render after lines were spliced at `start`. The old editing line
    /// is refreshed too when it sits above the splice.
    fn rerender_structural(&mut self, start: usize, editing: usize) -> Range<usize> {
        let mut stale = self.document.set_editing(Some(editing));
        stale.retain(|&i| i < start);
        self.document.render_indices(&stale);
        covering(self.document.render_from(start), &stale)
    }

    fn finish(&mut self, operation: &'static str, cursor: CursorPosition, rendered: Range<usize>) -> EditOutcome {
        self.cursor = cursor;
        tracing::debug!(
            operation,
            line = cursor.line_index,
            offset = cursor.char_offset,
            rendered = ?rendered,
            "edit applied"
        );
        crate::perf::log_event(
            "edit",
            format!(
                "{operation} cursor={}:{} rendered={rendered:?}",
                cursor.line_index, cursor.char_offset
            ),
        );
        EditOutcome { cursor, rendered }
    }

    /// Validate a position and return the line's length in characters.
    fn check_position(&self, at: CursorPosition) -> Result<usize, EditError> {
        let len = self.document.check_line(at.line_index)?.char_len();
        if at.char_offset > len {
            return Err(EditError::OffsetOutOfRange {
                line: at.line_index,
                offset: at.char_offset,
                len,
            });
        }
        Ok(len)
    }

    fn raw(&self, line_index: usize) -> String {
        self.document
            .line(line_index)
            .map(|l| l.raw().to_string())
            .unwrap_or_default()
    }
}

const fn empty_range(at: usize) -> Range<usize> {
    at..at
}

/// Grow `range` to hold every index in `extra`.
fn covering(range: Range<usize>, extra: &[usize]) -> Range<usize> {
    extra.iter().fold(range, |range, &index| {
        if range.is_empty() {
            index..index + 1
        } else {
            range.start.min(index)..range.end.max(index + 1)
        }
    })
}

fn fence_signature(line: &str) -> (bool, bool) {
    (BlockKind::Code.is_fence(line), BlockKind::Math.is_fence(line))
}
