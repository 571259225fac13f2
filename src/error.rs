//! Error types shared across the engine.
//!
//! Render and math failures never escape the renderer; they are reported
//! here so callers can log them before falling back to raw text.

use thiserror::Error;

/// A line could not be rendered from its request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("line index {index} is outside the document ({len} lines)")]
    LineOutOfRange { index: usize, len: usize },
}

/// A structural edit was rejected before touching the document.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("line index {index} is outside the document ({len} lines)")]
    LineOutOfRange { index: usize, len: usize },
    #[error("offset {offset} is past the end of line {line} ({len} chars)")]
    OffsetOutOfRange { line: usize, offset: usize, len: usize },
    #[error("line {line} has no neighbour to merge with")]
    NoNeighbour { line: usize },
    #[error("heading level {0} is not between 0 and 6")]
    InvalidHeadingLevel(u8),
    #[error(transparent)]
    Search(#[from] SearchError),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Reported by a [`crate::math::MathTypesetter`] that cannot typeset an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("cannot typeset expression: {0}")]
    Typeset(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script line {line}: {message}")]
    Parse { line: usize, message: String },
}
