//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Source bytes are not an image in a supported format.
    #[display("source image could not be decoded")]
    Decode,
    #[display("rendered image could not be encoded")]
    Encode,
    /// A transform parameter is missing its expected type or out of range.
    #[display("invalid transform: {_0}")]
    InvalidTransform(#[error(not(source))] &'static str),
    /// The blocking render task panicked or was cancelled.
    #[display("render task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Task)
    }
}
