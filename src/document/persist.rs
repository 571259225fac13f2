//! Boundary to whatever stores documents.
//!
//! The core never touches the file system; a [`Persistence`] hands it the
//! newline-joined text on open and receives the same join on save.

use std::convert::Infallible;

pub trait Persistence {
    type Error;

    /// The full document text.
    ///
    /// # Errors
    /// Implementation-defined; the document is not created on failure.
    fn load(&mut self) -> Result<String, Self::Error>;

    /// Store the full document text.
    ///
    /// # Errors
    /// Implementation-defined; the document stays dirty on failure.
    fn save(&mut self, content: &str) -> Result<(), Self::Error>;
}

/// Holds the document text in memory. Useful for tests and for surfaces
/// that manage storage themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub content: String,
    pub saves: usize,
}

impl MemoryStore {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            saves: 0,
        }
    }
}

impl Persistence for MemoryStore {
    type Error = Infallible;

    fn load(&mut self) -> Result<String, Self::Error> {
        Ok(self.content.clone())
    }

    fn save(&mut self, content: &str) -> Result<(), Self::Error> {
        content.clone_into(&mut self.content);
        self.saves += 1;
        Ok(())
    }
}
