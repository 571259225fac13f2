//! Translation between caret offsets in rendered markup and raw text.
//!
//! Structural wrappers add elements, not visible characters, so counting the
//! text characters before the caret and reusing that count as a raw offset
//! is exact whenever markers are visible. A line entering edit mode is
//! re-rendered with markers shown for that reason; for lines with hidden
//! markers the translation is a clamped approximation.

use thiserror::Error;

use crate::document::{CursorPosition, Document};

/// The surface refused to put the caret where it was asked to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaretError {
    #[error("line {0} is not attached to the surface")]
    Detached(usize),
    #[error("offset {offset} is outside line {line}")]
    OutOfRange { line: usize, offset: usize },
}

/// What the core needs from an editing surface (DOM, terminal grid,
/// virtual buffer) to keep the caret in place across re-renders.
pub trait CaretSurface {
    /// Current caret as `(line index, offset in rendered characters)`.
    fn caret(&self) -> Option<(usize, usize)>;

    /// Put the caret at a rendered-character offset within a line.
    ///
    /// # Errors
    /// Returns a [`CaretError`] if the line or offset cannot hold a caret.
    fn place_caret(&mut self, line: usize, rendered_offset: usize) -> Result<(), CaretError>;
}

/// Visible text of a rendered line: tags dropped, entities decoded.
pub fn visible_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text).into_owned()
}

pub fn visible_len(html: &str) -> usize {
    visible_text(html).chars().count()
}

/// Raw offset for a caret `rendered_offset` characters into `html`.
pub fn rendered_to_raw(html: &str, rendered_offset: usize, raw: &str) -> usize {
    rendered_offset
        .min(visible_len(html))
        .min(raw.chars().count())
}

/// Rendered offset for a caret `raw_offset` characters into `raw`.
pub fn raw_to_rendered(html: &str, raw_offset: usize, raw: &str) -> usize {
    raw_offset
        .min(raw.chars().count())
        .min(visible_len(html))
}

/// Reads and restores carets against one document's render cache.
#[derive(Debug, Clone, Copy)]
pub struct CursorTranslator<'a> {
    document: &'a Document,
}

impl<'a> CursorTranslator<'a> {
    pub const fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Raw position for a rendered caret. Lines past the end clamp to the
    /// last line; offsets clamp to the line.
    pub fn to_raw(&self, line_index: usize, rendered_offset: usize) -> CursorPosition {
        let last = self.document.line_count().saturating_sub(1);
        let line_index = line_index.min(last);
        self.document
            .line(line_index)
            .map_or(CursorPosition::line_start(line_index), |line| {
                CursorPosition::new(
                    line_index,
                    rendered_to_raw(line.rendered(), rendered_offset, line.raw()),
                )
            })
    }

    /// Rendered offset for a raw position, clamped the same way.
    pub fn to_rendered(&self, position: CursorPosition) -> usize {
        self.document
            .line(position.line_index)
            .map_or(0, |line| {
                raw_to_rendered(line.rendered(), position.char_offset, line.raw())
            })
    }

    /// The surface's caret in raw coordinates, or the document start if
    /// the surface has none.
    pub fn read_caret(&self, surface: &impl CaretSurface) -> CursorPosition {
        surface
            .caret()
            .map_or_else(CursorPosition::default, |(line, offset)| {
                self.to_raw(line, offset)
            })
    }

    /// Put the surface caret back at `position`. If that fails the caret
    /// goes to the start of the line; the caret is never left unset.
    pub fn restore_caret(&self, surface: &mut impl CaretSurface, position: CursorPosition) {
        let offset = self.to_rendered(position);
        let Err(err) = surface.place_caret(position.line_index, offset) else {
            return;
        };
        tracing::warn!(line = position.line_index, offset, %err, "caret restore fell back to line start");
        if let Err(err) = surface.place_caret(position.line_index, 0) {
            tracing::warn!(line = position.line_index, %err, "caret could not be placed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surface that knows how many lines it shows.
    #[derive(Debug, Default)]
    struct FakeSurface {
        lines: usize,
        max_offset: usize,
        caret: Option<(usize, usize)>,
        attempts: Vec<(usize, usize)>,
    }

    impl CaretSurface for FakeSurface {
        fn caret(&self) -> Option<(usize, usize)> {
            self.caret
        }

        fn place_caret(&mut self, line: usize, rendered_offset: usize) -> Result<(), CaretError> {
            self.attempts.push((line, rendered_offset));
            if line >= self.lines {
                return Err(CaretError::Detached(line));
            }
            if rendered_offset > self.max_offset {
                return Err(CaretError::OutOfRange {
                    line,
                    offset: rendered_offset,
                });
            }
            self.caret = Some((line, rendered_offset));
            Ok(())
        }
    }

    #[test]
    fn test_visible_text_strips_tags_and_decodes() {
        assert_eq!(
            visible_text("<strong>**a &amp; b**</strong> &lt;x&gt;"),
            "**a & b** <x>"
        );
        assert_eq!(visible_text("<br>"), "");
    }

    #[test]
    fn test_editing_markup_translates_exactly() {
        let mut document = Document::load("## **Title** & more");
        document.begin_editing(0).unwrap();
        let line = document.line(0).unwrap();
        assert_eq!(visible_text(line.rendered()), line.raw());

        let translator = CursorTranslator::new(&document);
        for offset in 0..=line.char_len() {
            let raw = translator.to_raw(0, offset);
            assert_eq!(raw, CursorPosition::new(0, offset));
            assert_eq!(translator.to_rendered(raw), offset);
        }
    }

    #[test]
    fn test_private_use_characters_keep_editing_text_exact() {
        let mut document = Document::load("a\u{E000}b **c\u{E001}0**");
        document.begin_editing(0).unwrap();
        let line = document.line(0).unwrap();
        assert_eq!(visible_text(line.rendered()), line.raw());
    }

    #[test]
    fn test_hidden_markers_clamp_to_raw_length() {
        let document = Document::load("---");
        let translator = CursorTranslator::new(&document);
        assert_eq!(translator.to_raw(0, 30).char_offset, 3);
    }

    #[test]
    fn test_offsets_past_visible_text_clamp() {
        let document = Document::load("## Hi");
        let translator = CursorTranslator::new(&document);
        // visible "Hi" is shorter than raw "## Hi"
        assert_eq!(translator.to_raw(0, 10).char_offset, 2);
        assert_eq!(translator.to_rendered(CursorPosition::new(0, 5)), 2);
    }

    #[test]
    fn test_line_past_end_clamps_to_last_line() {
        let document = Document::load("a\nbc");
        let translator = CursorTranslator::new(&document);
        assert_eq!(translator.to_raw(9, 1), CursorPosition::new(1, 1));
        assert_eq!(translator.to_rendered(CursorPosition::new(9, 1)), 0);
    }

    #[test]
    fn test_read_caret_defaults_to_document_start() {
        let document = Document::load("abc");
        let translator = CursorTranslator::new(&document);
        let surface = FakeSurface::default();
        assert_eq!(translator.read_caret(&surface), CursorPosition::default());

        let surface = FakeSurface {
            caret: Some((0, 2)),
            ..FakeSurface::default()
        };
        assert_eq!(translator.read_caret(&surface), CursorPosition::new(0, 2));
    }

    #[test]
    fn test_restore_caret_falls_back_to_line_start() {
        let document = Document::load("abcdef");
        let translator = CursorTranslator::new(&document);
        let mut surface = FakeSurface {
            lines: 1,
            max_offset: 2,
            ..FakeSurface::default()
        };
        translator.restore_caret(&mut surface, CursorPosition::new(0, 5));
        assert_eq!(surface.attempts, vec![(0, 5), (0, 0)]);
        assert_eq!(surface.caret, Some((0, 0)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn translation_stays_within_bounds(
                raw in "[-#>*_`~\\[\\]() a-z<&0-9\\x{E000}\\x{E001}]{0,30}",
                offset in 0..64usize,
            ) {
                let mut document = Document::load(&raw);
                let translator = CursorTranslator::new(&document);
                let position = translator.to_raw(0, offset);
                prop_assert!(position.char_offset <= document.line(0).unwrap().char_len());

                document.begin_editing(0).unwrap();
                let line = document.line(0).unwrap();
                prop_assert_eq!(visible_text(line.rendered()), line.raw().to_string());
            }
        }
    }
}
