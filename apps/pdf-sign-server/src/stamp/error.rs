//! Stamping error types

use thiserror::Error;

/// Errors raised while stamping a document
#[derive(Debug, Error)]
pub enum StampError {
    /// Input bytes are not a readable PDF
    #[error("Parse error: {0}")]
    Parse(String),

    /// A page's visible-area box is missing or unusable
    #[error("Parse error: page {page} has no usable page box ({reason})")]
    PageGeometry { page: usize, reason: String },

    /// Serializing the stamped document failed
    #[error("Write error: {0}")]
    Write(String),
}

impl StampError {
    /// Whether the error was caused by the input document rather than by us
    pub fn is_parse_error(&self) -> bool {
        matches!(self, StampError::Parse(_) | StampError::PageGeometry { .. })
    }
}

/// Result type alias for stamping operations
pub type Result<T> = std::result::Result<T, StampError>;

impl From<lopdf::Error> for StampError {
    fn from(err: lopdf::Error) -> Self {
        StampError::Parse(err.to_string())
    }
}
