//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::models::{MediaId, RecordId};
use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No record is stored under the requested id.
    #[display("record not found: {_0}")]
    RecordNotFound(#[error(not(source))] RecordId),
    /// No media blob is stored under the requested id.
    #[display("media not found: {_0}")]
    MediaNotFound(#[error(not(source))] MediaId),
    /// Stored data could not be converted into (or out of) its model.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// The store refused a write because it is read-only.
    #[display("store is read-only")]
    ReadOnly,
    /// Backend-specific error (database connection, query failure, etc.)
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendError(_))
    }

    /// Returns `true` if the error reports a missing record or media blob.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound(_) | Self::MediaNotFound(_))
    }
}
