//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors raised by the store or the
//! renderer are kept as children of the library error.

use darkroom_storage::error::Error as StorageError;
use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store has no record or media blob under a requested id.
    #[display("not found in store")]
    NotFound,
    /// The renderer failed to produce an edited image or thumbnail.
    #[display("rendering failed")]
    Render,
    /// Reading from, writing to or opening the store failed.
    #[display("store operation failed")]
    Store,
    /// A transform could not be converted to or from its persisted form.
    #[display("invalid record data")]
    InvalidData,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}

impl ErrorKind {
    /// Convert a store error into a library error, keeping "not found"
    /// distinct from every other store failure and preserving the storage
    /// crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn store(err: StorageError) -> Error {
        let kind = if err.is_not_found() { Self::NotFound } else { Self::Store };
        err.raise(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_storage::error::ErrorKind as StorageErrorKind;
    use darkroom_storage::{MediaId, RecordId};
    use rstest::rstest;

    #[rstest]
    #[case(StorageErrorKind::RecordNotFound(RecordId(1)), ErrorKind::NotFound)]
    #[case(StorageErrorKind::MediaNotFound(MediaId(1)), ErrorKind::NotFound)]
    #[case(StorageErrorKind::ReadOnly, ErrorKind::Store)]
    #[case(StorageErrorKind::BackendError("disk full".to_string()), ErrorKind::Store)]
    fn test_store_errors_are_classified(#[case] source: StorageErrorKind, #[case] expected: ErrorKind) {
        let err = ErrorKind::store(exn::Exn::from(source));
        assert_eq!(*err, expected);
    }
}
