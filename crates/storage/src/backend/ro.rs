//! Read-only record store.
//!
//! This module provides a store implementation that wraps other
//! implementations and prevents write operations from executing, while still
//! indicating success on return wherever that's possible.

use async_trait::async_trait;

use crate::backend::RecordStream;
use crate::error::{ErrorKind, Result};
use crate::models::{MediaId, RecordId, StoredRecord};
use crate::{RecordStore, StoreHandle};

/// Read-only record store.
///
/// Wraps another store and silently drops all write operations, logging an
/// [`info event`](tracing::Event). Writes that would need the store to
/// allocate a new id can't pretend to succeed and fail with
/// [`ErrorKind::ReadOnly`] instead.
#[derive(Clone)]
pub struct ReadOnlyStore {
    inner: StoreHandle,
}
impl ReadOnlyStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordStore for ReadOnlyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn retrieve_record(&self, id: RecordId) -> Result<StoredRecord> {
        self.inner.retrieve_record(id).await
    }

    async fn retrieve_media(&self, id: MediaId) -> Result<Vec<u8>> {
        self.inner.retrieve_media(id).await
    }

    async fn store_media(&self, data: &[u8], existing: Option<MediaId>) -> Result<MediaId> {
        let Some(id) = existing else {
            exn::bail!(ErrorKind::ReadOnly);
        };
        tracing::info!(media = %id, bytes = data.len(), "Skipping media write during read-only mode");
        Ok(id)
    }

    async fn store_record(&self, record: &StoredRecord) -> Result<RecordId> {
        let Some(id) = record.id else {
            exn::bail!(ErrorKind::ReadOnly);
        };
        tracing::info!(record = %id, guid = %record.guid, "Skipping record write during read-only mode");
        Ok(id)
    }

    async fn delete_record(&self, id: RecordId, media: &[MediaId]) -> Result<()> {
        tracing::info!(record = %id, media = media.len(), "Skipping delete during read-only mode");
        Ok(())
    }

    fn all_stream(&self) -> RecordStream<'_> {
        self.inner.all_stream()
    }
}
