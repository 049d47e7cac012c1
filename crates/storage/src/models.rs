//! Storage models.
//!
//! These types are the persisted (wire) form of a record: what a store hands
//! back when asked for a record, and what the library upserts on save.

use derive_more::{Display, From};
use std::sync::Arc;

/// An in-memory binary artifact (encoded image bytes).
///
/// Shared rather than owned, so that handing a cached artifact back to a
/// caller doesn't copy the whole image.
pub type Blob = Arc<[u8]>;

/// Persisted form of a transform: a plain string-keyed mapping.
pub type TransformMap = serde_json::Map<String, serde_json::Value>;

/// Identifier of a persisted record.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{_0}")]
pub struct RecordId(pub i64);

/// Identifier of a persisted media blob.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{_0}")]
pub struct MediaId(pub i64);

/// Plain snapshot of a record as it is persisted.
///
/// `id` is absent until the record has been stored once; the store assigns
/// it on the first [`store_record`](crate::RecordStore::store_record).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Option<RecordId>,
    /// Stable external identifier, assigned once.
    pub guid: String,
    pub original_id: Option<MediaId>,
    pub edited_id: Option<MediaId>,
    pub thumbnail_id: Option<MediaId>,
    /// Persisted transform; an empty mapping means "no transform".
    pub transform: TransformMap,
    pub local_image_changes: bool,
    pub local_filter_changes: bool,
    /// Version stamp of the last external synchronization, `-1` if never.
    pub last_sync_version: i64,
}
impl StoredRecord {
    /// All media ids referenced by this record, in dependency order.
    pub fn media_ids(&self) -> Vec<MediaId> {
        [self.original_id, self.edited_id, self.thumbnail_id].into_iter().flatten().collect()
    }
}
