//! In-memory record store for testing.

use super::RecordStream;
use crate::RecordStore;
use crate::error::{ErrorKind, Result};
use crate::models::{MediaId, RecordId, StoredRecord};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// A call made against a [`MockStore`], in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    RetrieveRecord(RecordId),
    RetrieveMedia(MediaId),
    StoreMedia(Option<MediaId>),
    StoreRecord(Option<RecordId>),
    DeleteRecord(RecordId, Vec<MediaId>),
    All,
}

#[derive(Default)]
struct State {
    records: BTreeMap<RecordId, StoredRecord>,
    media: HashMap<MediaId, Vec<u8>>,
    last_record: i64,
    last_media: i64,
    operations: Vec<Operation>,
}

/// In-memory record store for testing.
///
/// Records and media live in maps behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Every call is
/// appended to an operation log so tests can assert on exactly which store
/// calls were made.
pub struct MockStore {
    name: String,
    fail_record_writes: bool,
    state: RwLock<State>,
}

impl MockStore {
    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every [`store_record`](RecordStore::store_record) call fail with
    /// a backend error (media writes still succeed).
    pub fn with_failing_record_writes(mut self) -> Self {
        self.fail_record_writes = true;
        self
    }

    /// Every call made so far, oldest first.
    pub async fn operations(&self) -> Vec<Operation> {
        self.state.read().await.operations.clone()
    }

    /// Forget the calls made so far (stored data is kept).
    pub async fn clear_operations(&self) {
        self.state.write().await.operations.clear();
    }

    /// Number of media blobs currently stored.
    pub async fn media_count(&self) -> usize {
        self.state.read().await.media.len()
    }

    /// Number of records currently stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            fail_record_writes: false,
            state: RwLock::new(State::default()),
        }
    }
}

#[async_trait]
impl RecordStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve_record(&self, id: RecordId) -> Result<StoredRecord> {
        let mut state = self.state.write().await;
        state.operations.push(Operation::RetrieveRecord(id));
        state.records.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::RecordNotFound(id)))
    }

    async fn retrieve_media(&self, id: MediaId) -> Result<Vec<u8>> {
        let mut state = self.state.write().await;
        state.operations.push(Operation::RetrieveMedia(id));
        state.media.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::MediaNotFound(id)))
    }

    async fn store_media(&self, data: &[u8], existing: Option<MediaId>) -> Result<MediaId> {
        let mut state = self.state.write().await;
        state.operations.push(Operation::StoreMedia(existing));
        let id = match existing {
            Some(id) => {
                state.last_media = state.last_media.max(id.0);
                id
            },
            None => {
                state.last_media += 1;
                MediaId(state.last_media)
            },
        };
        state.media.insert(id, data.to_vec());
        Ok(id)
    }

    async fn store_record(&self, record: &StoredRecord) -> Result<RecordId> {
        let mut state = self.state.write().await;
        state.operations.push(Operation::StoreRecord(record.id));
        if self.fail_record_writes {
            exn::bail!(ErrorKind::BackendError("record writes disabled".to_string()));
        }
        let id = match record.id {
            Some(id) => {
                state.last_record = state.last_record.max(id.0);
                id
            },
            None => {
                state.last_record += 1;
                RecordId(state.last_record)
            },
        };
        state.records.insert(id, StoredRecord { id: Some(id), ..record.clone() });
        Ok(id)
    }

    async fn delete_record(&self, id: RecordId, media: &[MediaId]) -> Result<()> {
        let mut state = self.state.write().await;
        state.operations.push(Operation::DeleteRecord(id, media.to_vec()));
        if state.records.remove(&id).is_none() {
            exn::bail!(ErrorKind::RecordNotFound(id));
        }
        for media_id in media {
            state.media.remove(media_id);
        }
        Ok(())
    }

    fn all_stream(&self) -> RecordStream<'_> {
        Box::pin(stream! {
            // Snapshot under the lock, then drop it before yielding to avoid
            // holding the lock across yield points.
            let records: Vec<StoredRecord> = {
                let mut state = self.state.write().await;
                state.operations.push(Operation::All);
                state.records.values().cloned().collect()
            };
            for record in records {
                yield Ok(record);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransformMap;

    fn record(guid: &str) -> StoredRecord {
        StoredRecord {
            id: None,
            guid: guid.to_string(),
            original_id: None,
            edited_id: None,
            thumbnail_id: None,
            transform: TransformMap::new(),
            local_image_changes: true,
            local_filter_changes: true,
            last_sync_version: -1,
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve_media() {
        let store = MockStore::default();
        let id = store.store_media(b"hello", None).await.unwrap();
        assert_eq!(store.retrieve_media(id).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_store_media_overwrites_in_place() {
        let store = MockStore::default();
        let id = store.store_media(b"first", None).await.unwrap();
        let again = store.store_media(b"second", Some(id)).await.unwrap();
        assert_eq!(id, again);
        assert_eq!(store.retrieve_media(id).await.unwrap(), b"second");
        assert_eq!(store.media_count().await, 1);
    }

    #[tokio::test]
    async fn test_new_ids_never_collide_with_explicit_ids() {
        let store = MockStore::default();
        store.store_media(b"explicit", Some(MediaId(7))).await.unwrap();
        let allocated = store.store_media(b"allocated", None).await.unwrap();
        assert_eq!(allocated, MediaId(8));
    }

    #[tokio::test]
    async fn test_retrieve_not_found() {
        let store = MockStore::default();
        let err = store.retrieve_media(MediaId(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MediaNotFound(MediaId(1))));
        let err = store.retrieve_record(RecordId(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RecordNotFound(RecordId(1))));
    }

    #[tokio::test]
    async fn test_store_record_upserts() {
        let store = MockStore::default();
        let id = store.store_record(&record("a")).await.unwrap();
        let mut stored = store.retrieve_record(id).await.unwrap();
        assert_eq!(stored.id, Some(id));
        stored.last_sync_version = 4;
        assert_eq!(store.store_record(&stored).await.unwrap(), id);
        assert_eq!(store.retrieve_record(id).await.unwrap().last_sync_version, 4);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_record_removes_media() {
        let store = MockStore::default();
        let media = store.store_media(b"pixels", None).await.unwrap();
        let id = store.store_record(&StoredRecord { original_id: Some(media), ..record("a") }).await.unwrap();
        store.delete_record(id, &[media]).await.unwrap();
        assert_eq!(store.media_count().await, 0);
        assert_eq!(store.record_count().await, 0);
        // Deleting again reports the missing record.
        let err = store.delete_record(id, &[media]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_all() {
        let store = MockStore::default();
        store.store_record(&record("a")).await.unwrap();
        store.store_record(&record("b")).await.unwrap();
        let guids: Vec<_> = store.all().await.unwrap().into_iter().map(|r| r.guid).collect();
        assert_eq!(guids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_operations_are_logged() {
        let store = MockStore::default();
        let id = store.store_record(&record("a")).await.unwrap();
        store.retrieve_record(id).await.unwrap();
        assert_eq!(store.operations().await, vec![Operation::StoreRecord(None), Operation::RetrieveRecord(id)]);
        store.clear_operations().await;
        assert!(store.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_record_writes() {
        let store = MockStore::default().with_failing_record_writes();
        let err = store.store_record(&record("a")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert_eq!(store.record_count().await, 0);
    }
}
