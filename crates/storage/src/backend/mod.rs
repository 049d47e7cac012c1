//! Record store trait and implementations.
//!
//! This module defines the `RecordStore` trait, which provides a unified
//! interface for persisting records and their media blobs across different
//! backends (SQLite in `darkroom-cache`, in-memory for tests, etc.).

#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockStore, Operation};
pub use self::ro::ReadOnlyStore;
use crate::error::Result;
use crate::models::{MediaId, RecordId, StoredRecord};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<StoredRecord>> + Send + 'a>>;

/// Unified interface for record stores.
///
/// A store persists two kinds of things: media blobs, addressed by
/// [`MediaId`], and record metadata, addressed by [`RecordId`]. Ids are
/// assigned by the store. All operations are asynchronous.
///
/// # Examples
///
/// ```
/// use darkroom_storage::{RecordId, RecordStore, error::Result};
///
/// async fn original_size(store: &dyn RecordStore, id: RecordId) -> Result<usize> {
///     let record = store.retrieve_record(id).await?;
///     match record.original_id {
///         Some(media) => Ok(store.retrieve_media(media).await?.len()),
///         None => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Fetch record metadata by id.
    ///
    /// Returns [`RecordNotFound`](crate::error::ErrorKind::RecordNotFound) if
    /// no record is stored under `id`.
    async fn retrieve_record(&self, id: RecordId) -> Result<StoredRecord>;

    /// Fetch a media blob by id.
    ///
    /// Returns [`MediaNotFound`](crate::error::ErrorKind::MediaNotFound) if no
    /// blob is stored under `id`.
    async fn retrieve_media(&self, id: MediaId) -> Result<Vec<u8>>;

    /// Write a media blob.
    ///
    /// With `existing` set, the blob stored under that id is overwritten in
    /// place and the same id is returned. Without it, a new id is allocated.
    async fn store_media(&self, data: &[u8], existing: Option<MediaId>) -> Result<MediaId>;

    /// Upsert record metadata, returning the id it is stored under.
    ///
    /// A record without an id is inserted and assigned a new one.
    async fn store_record(&self, record: &StoredRecord) -> Result<RecordId>;

    /// Remove a record together with the listed media blobs.
    ///
    /// From the caller's perspective this is a single operation: either the
    /// record and all listed blobs are gone afterwards, or an error is
    /// returned. Returns [`RecordNotFound`](crate::error::ErrorKind::RecordNotFound)
    /// if the record doesn't exist.
    async fn delete_record(&self, id: RecordId, media: &[MediaId]) -> Result<()>;

    /// Stream every persisted record.
    fn all_stream(&self) -> RecordStream<'_>;

    /// Enumerate every persisted record.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`all_stream()`](Self::all_stream) into a [`Vec`] before
    /// returning.
    async fn all(&self) -> Result<Vec<StoredRecord>> {
        self.all_stream().try_collect().await
    }
}
