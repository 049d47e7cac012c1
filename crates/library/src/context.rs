use crate::error::{ErrorKind, Result};
use darkroom_cache::{Database, SqliteStore};
use darkroom_config::{Config, DEFAULT_THUMBNAIL_HEIGHT};
use darkroom_render::{ImageRenderer, RendererHandle};
use darkroom_storage::StoreHandle;
use darkroom_storage::backend::ReadOnlyStore;
use exn::ResultExt;
use std::sync::Arc;
use tracing::instrument;

/// Collaborators shared by every record: where records are persisted, how
/// derived artifacts are rendered, and how tall thumbnails are.
///
/// Cheap to clone; records each hold their own copy.
#[derive(Clone)]
pub struct Context {
    store: StoreHandle,
    renderer: RendererHandle,
    thumbnail_height: u32,
}

impl Context {
    pub fn new(store: StoreHandle, renderer: RendererHandle) -> Self {
        Self { store, renderer, thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT }
    }

    pub fn with_thumbnail_height(mut self, height: u32) -> Self {
        self.thumbnail_height = height;
        self
    }

    /// Open the SQLite store and image renderer described by `config`.
    ///
    /// The database (and its parent directory) is created if missing. With
    /// `read_only` set, the store is wrapped so existing records are never
    /// modified.
    #[instrument(skip_all, fields(database = %config.database.display(), read_only = config.read_only))]
    pub async fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Store)?;
        }
        let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Store)?;
        let mut store: StoreHandle = Arc::new(SqliteStore::from(&db));
        if config.read_only {
            store = Arc::new(ReadOnlyStore::new(store));
        }
        tracing::debug!(store = store.name(), encoding = %config.encoding, "Opened library");
        let renderer = Arc::new(ImageRenderer::new(config.encoding));
        Ok(Self::new(store, renderer).with_thumbnail_height(config.thumbnail_height))
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn renderer(&self) -> &RendererHandle {
        &self.renderer
    }

    pub fn thumbnail_height(&self) -> u32 {
        self.thumbnail_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArtifactKind, Record};
    use darkroom_render::{Encoding, Transform};
    use std::io::Cursor;

    fn config(dir: &tempfile::TempDir, read_only: bool) -> Config {
        Config {
            database: dir.path().join("nested").join("library.sqlite"),
            read_only,
            thumbnail_height: 4,
            encoding: Encoding::Png,
        }
    }

    fn photo() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(16, 8, image::Rgba([40, 80, 120, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, false);
        let ctx = Context::open(&config).await.unwrap();
        assert_eq!(ctx.store().name(), "sqlite");
        assert_eq!(ctx.thumbnail_height(), 4);
        assert!(config.database.is_file());
    }

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::open(&config(&dir, false)).await.unwrap();
        let mut record = Record::new(ctx.clone());
        record.set_original(photo());
        record.set_transform(Some(Transform { exposure: 1.0, ..Transform::default() })).unwrap();
        let id = record.save().await.unwrap();

        let mut reloaded = Record::from_database(ctx.clone(), id).await.unwrap();
        assert_eq!(reloaded.guid(), record.guid());
        assert_eq!(reloaded.transform(), record.transform());
        assert_eq!(reloaded.original().await.unwrap(), record.original().await.unwrap());
        assert_eq!(reloaded.edited().await.unwrap(), record.edited().await.unwrap());
        let thumbnail = reloaded.thumbnail().await.unwrap().unwrap();
        assert_eq!(image::load_from_memory(&thumbnail).unwrap().height(), 4);
        assert_eq!(Record::all(&ctx).await.unwrap().len(), 1);

        reloaded.delete().await.unwrap();
        assert!(Record::all(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_refuses_new_records() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let ctx = Context::open(&config(&dir, false)).await.unwrap();
            let mut record = Record::new(ctx);
            record.set_original(photo());
            record.save().await.unwrap()
        };

        let ctx = Context::open(&config(&dir, true)).await.unwrap();
        let mut record = Record::new(ctx.clone());
        record.set_original(photo());
        let err = record.save().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Store);

        // Existing records can still be read, and "saved" without changes.
        let mut existing = Record::from_database(ctx.clone(), id).await.unwrap();
        assert_eq!(existing.original().await.unwrap().map(|b| b.to_vec()), Some(photo()));
        existing.set_original(b"overwritten".to_vec());
        assert_eq!(existing.save().await.unwrap(), id);
        let mut again = Record::from_database(ctx, id).await.unwrap();
        assert_eq!(again.original().await.unwrap().map(|b| b.to_vec()), Some(photo()));
        assert!(again.media_id(ArtifactKind::Edited).is_none());
    }
}
