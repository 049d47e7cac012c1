//! [`RecordStore`] implementation on top of the SQLite [`Database`].

use crate::Database;
use crate::models::RecordRow;
use async_stream::stream;
use async_trait::async_trait;
use darkroom_storage::backend::RecordStream;
use darkroom_storage::error::{ErrorKind, Result};
use darkroom_storage::{MediaId, RecordId, RecordStore, StoredRecord};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use sqlx::SqlitePool;

fn query_failed() -> ErrorKind {
    ErrorKind::BackendError("sqlite query failed".to_string())
}

/// Record store backed by the SQLite cache database.
///
/// Media blobs are stored in their own table and referenced by id from the
/// record row. All ids are SQLite `AUTOINCREMENT` keys, so an id is never
/// reused after its row has been deleted.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    name: String,
    pool: SqlitePool,
}
impl From<&Database> for SqliteStore {
    fn from(db: &Database) -> Self {
        Self::new("sqlite", db.pool().clone())
    }
}
impl SqliteStore {
    /// Create a new store with the given connection pool.
    pub fn new(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self { name: name.into(), pool }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve_record(&self, id: RecordId) -> Result<StoredRecord> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_record.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(query_failed)?;
        row.ok_or_raise(|| ErrorKind::RecordNotFound(id))?.try_into()
    }

    async fn retrieve_media(&self, id: MediaId) -> Result<Vec<u8>> {
        let data: Option<Vec<u8>> = sqlx::query_scalar(include_str!("../queries/get_media.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(query_failed)?;
        data.ok_or_raise(|| ErrorKind::MediaNotFound(id))
    }

    async fn store_media(&self, data: &[u8], existing: Option<MediaId>) -> Result<MediaId> {
        let size = i64::try_from(data.len()).or_raise(|| ErrorKind::InvalidData("media size"))?;
        let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_media.sql"))
            .bind(existing.map(|id| id.0))
            .bind(data)
            .bind(size)
            .fetch_one(&self.pool)
            .await
            .or_raise(query_failed)?;
        tracing::trace!(store = %self.name, media = id, bytes = data.len(), "Media stored");
        Ok(MediaId(id))
    }

    async fn store_record(&self, record: &StoredRecord) -> Result<RecordId> {
        let row = RecordRow::try_from(record)?;
        let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_record.sql"))
            .bind(row.id)
            .bind(row.guid)
            .bind(row.original_id)
            .bind(row.edited_id)
            .bind(row.thumbnail_id)
            .bind(row.transform)
            .bind(row.local_image_changes)
            .bind(row.local_filter_changes)
            .bind(row.last_sync_version)
            .fetch_one(&self.pool)
            .await
            .or_raise(query_failed)?;
        Ok(RecordId(id))
    }

    async fn delete_record(&self, id: RecordId, media: &[MediaId]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(query_failed)?;
        let deleted = sqlx::query(include_str!("../queries/delete_record.sql"))
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .or_raise(query_failed)?;
        if deleted.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            exn::bail!(ErrorKind::RecordNotFound(id));
        }
        for media_id in media {
            sqlx::query(include_str!("../queries/delete_media.sql"))
                .bind(media_id.0)
                .execute(&mut *tx)
                .await
                .or_raise(query_failed)?;
        }
        tx.commit().await.or_raise(query_failed)?;
        Ok(())
    }

    fn all_stream(&self) -> RecordStream<'_> {
        Box::pin(stream! {
            let mut rows = sqlx::query_as::<_, RecordRow>(include_str!("../queries/list_records.sql")).fetch(&self.pool);
            while let Some(row) = rows.next().await {
                yield row.or_raise(query_failed).and_then(StoredRecord::try_from);
            }
        })
    }
}
