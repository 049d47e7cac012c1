use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::slot::{ArtifactKind, Change, Derivation, Slot, SlotState, Slots, invalidate_dependents};
use darkroom_render::Transform;
use darkroom_storage::{Blob, MediaId, RecordId, StoredRecord, TransformMap};
use exn::ResultExt;
use tracing::instrument;

/// A record and its cached artifacts: the original image, the edited image
/// (the original rendered through the transform), and a thumbnail of the
/// edited image.
///
/// Artifacts are fetched from the store and derived through the renderer on
/// first access, then kept in memory. Changing the original or the transform
/// marks both derived artifacts out of date; they are rendered again the
/// next time they are accessed or saved, so a stale artifact is never
/// persisted.
///
/// Every mutating method takes `&mut self`: one writer per record at a time.
pub struct Record {
    ctx: Context,
    id: Option<RecordId>,
    guid: String,
    transform: Option<Transform>,
    slots: Slots,
    local_image_changes: bool,
    local_filter_changes: bool,
    last_sync_version: i64,
}

impl Record {
    /// A new record that has never been persisted.
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            id: None,
            guid: uuid::Uuid::new_v4().to_string(),
            transform: None,
            slots: Slots::fresh(),
            local_image_changes: true,
            local_filter_changes: true,
            last_sync_version: -1,
        }
    }

    /// Reconstruct a record from its persisted form. Nothing is fetched until
    /// an artifact is accessed.
    pub fn from_stored(ctx: Context, stored: StoredRecord) -> Result<Self> {
        let transform = Transform::from_persisted(&stored.transform).or_raise(|| ErrorKind::InvalidData)?;
        Ok(Self {
            ctx,
            id: stored.id,
            guid: stored.guid,
            transform,
            slots: Slots::stored(stored.original_id, stored.edited_id, stored.thumbnail_id),
            local_image_changes: stored.local_image_changes,
            local_filter_changes: stored.local_filter_changes,
            last_sync_version: stored.last_sync_version,
        })
    }

    #[instrument(skip(ctx))]
    pub async fn from_database(ctx: Context, id: RecordId) -> Result<Self> {
        let stored = ctx.store().retrieve_record(id).await.map_err(ErrorKind::store)?;
        Self::from_stored(ctx, StoredRecord { id: Some(id), ..stored })
    }

    /// Reconstruct every persisted record.
    pub async fn all(ctx: &Context) -> Result<Vec<Self>> {
        let stored = ctx.store().all().await.map_err(ErrorKind::store)?;
        tracing::debug!(store = ctx.store().name(), count = stored.len(), "Listed records");
        stored.into_iter().map(|record| Self::from_stored(ctx.clone(), record)).collect()
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn local_image_changes(&self) -> bool {
        self.local_image_changes
    }

    pub fn local_filter_changes(&self) -> bool {
        self.local_filter_changes
    }

    pub fn last_sync_version(&self) -> i64 {
        self.last_sync_version
    }

    pub fn state(&self, kind: ArtifactKind) -> SlotState {
        self.slots.get(kind).state()
    }

    /// Id of the persisted blob backing an artifact, if any.
    pub fn media_id(&self, kind: ArtifactKind) -> Option<MediaId> {
        self.slots.get(kind).id()
    }

    /// The original image. Fetched from the store on first access; never
    /// derived.
    pub async fn original(&mut self) -> Result<Option<Blob>> {
        self.resolve(ArtifactKind::Original).await
    }

    /// The original rendered through the transform at full size. `None`
    /// without a transform or an original.
    ///
    /// Rendered at most once per change of the original or the transform:
    /// a record that has never been saved returns the cached render rather
    /// than rendering again on every call.
    pub async fn edited(&mut self) -> Result<Option<Blob>> {
        self.resolve(ArtifactKind::Edited).await
    }

    /// Like [`edited`](Self::edited), scaled down to the context's thumbnail
    /// height.
    pub async fn thumbnail(&mut self) -> Result<Option<Blob>> {
        self.resolve(ArtifactKind::Thumbnail).await
    }

    /// Replace the original image. Both derived artifacts become out of date.
    pub fn set_original(&mut self, media: impl Into<Blob>) {
        let media = media.into();
        self.slots.update(ArtifactKind::Original, |slot| slot.changed(media));
        self.invalidate(Change::Original);
        self.local_image_changes = true;
    }

    /// Replace (or with `None`, remove) the transform. Both derived artifacts
    /// become out of date.
    pub fn set_transform(&mut self, transform: Option<Transform>) -> Result<()> {
        if let Some(transform) = &transform {
            transform.validate().or_raise(|| ErrorKind::InvalidData)?;
        }
        self.transform = transform;
        self.invalidate(Change::Transform);
        self.local_filter_changes = true;
        Ok(())
    }

    /// Record a completed external synchronization: clears both local change
    /// flags. Takes effect in the store on the next [`save`](Self::save).
    pub fn mark_synchronized(&mut self, version: i64) {
        self.local_image_changes = false;
        self.local_filter_changes = false;
        self.last_sync_version = version;
    }

    /// Persist pending artifacts then the record itself, returning the id the
    /// record is stored under.
    ///
    /// Runs strictly in dependency order: original, edited, thumbnail,
    /// metadata. Out-of-date derived artifacts are rendered again before they
    /// are written. A failure aborts the remaining steps; artifacts written
    /// before it stay written and calling `save` again is safe.
    #[instrument(skip_all, fields(record = ?self.id, guid = %self.guid))]
    pub async fn save(&mut self) -> Result<RecordId> {
        for kind in ArtifactKind::ALL {
            if let Derivation::Render(height) = kind.derivation(self.ctx.thumbnail_height())
                && self.state(kind) == SlotState::OutOfDate
            {
                self.rederive(kind, height).await?;
            }
            self.persist(kind).await?;
        }
        let snapshot = self.snapshot()?;
        let id = self.ctx.store().store_record(&snapshot).await.map_err(ErrorKind::store)?;
        tracing::debug!(record = %id, store = self.ctx.store().name(), "Record saved");
        self.id = Some(id);
        Ok(id)
    }

    /// The plain form [`save`](Self::save) writes to the store.
    pub fn snapshot(&self) -> Result<StoredRecord> {
        let transform = match &self.transform {
            Some(transform) => transform.to_persisted().or_raise(|| ErrorKind::InvalidData)?,
            None => TransformMap::new(),
        };
        Ok(StoredRecord {
            id: self.id,
            guid: self.guid.clone(),
            original_id: self.media_id(ArtifactKind::Original),
            edited_id: self.media_id(ArtifactKind::Edited),
            thumbnail_id: self.media_id(ArtifactKind::Thumbnail),
            transform,
            local_image_changes: self.local_image_changes,
            local_filter_changes: self.local_filter_changes,
            last_sync_version: self.last_sync_version,
        })
    }

    /// Remove the record and every persisted artifact from the store in one
    /// call. A record that was never saved has nothing to remove.
    #[instrument(skip_all, fields(record = ?self.id, guid = %self.guid))]
    pub async fn delete(self) -> Result<()> {
        let Some(id) = self.id else {
            tracing::debug!("Record was never saved, nothing to delete");
            return Ok(());
        };
        let media = self.slots.media_ids();
        self.ctx.store().delete_record(id, &media).await.map_err(ErrorKind::store)?;
        tracing::debug!(record = %id, media = media.len(), "Record deleted");
        Ok(())
    }

    fn invalidate(&mut self, change: Change) {
        self.slots = invalidate_dependents(std::mem::take(&mut self.slots), change);
    }

    async fn resolve(&mut self, kind: ArtifactKind) -> Result<Option<Blob>> {
        let Derivation::Render(height) = kind.derivation(self.ctx.thumbnail_height()) else {
            self.load(kind).await?;
            return Ok(self.slots.get(kind).value().cloned());
        };
        if self.transform.is_none() {
            // Nothing to render. A persisted blob can only be left over from
            // a removed transform, so it is never fetched.
            self.slots.update(kind, |slot| slot.derived(None));
            return Ok(None);
        }
        self.load(kind).await?;
        if self.slots.get(kind).needs_derivation() {
            self.rederive(kind, height).await?;
        }
        Ok(self.slots.get(kind).value().cloned())
    }

    /// Fetch the persisted blob if the slot has one and nothing in memory.
    async fn load(&mut self, kind: ArtifactKind) -> Result<()> {
        if let Slot::NotLoaded { id: Some(id) } = *self.slots.get(kind) {
            tracing::debug!(record = ?self.id, %kind, media = %id, "Fetching artifact");
            let data = self.ctx.store().retrieve_media(id).await.map_err(ErrorKind::store)?;
            self.slots.update(kind, |slot| slot.loaded(Blob::from(data)));
        }
        Ok(())
    }

    async fn rederive(&mut self, kind: ArtifactKind, height: Option<u32>) -> Result<()> {
        let value = self.render(height).await?;
        tracing::debug!(record = ?self.id, %kind, rendered = value.is_some(), "Derived artifact");
        self.slots.update(kind, |slot| slot.derived(value));
        Ok(())
    }

    /// Render the original through the transform. Without either there is
    /// nothing to render.
    async fn render(&mut self, height: Option<u32>) -> Result<Option<Blob>> {
        let Some(transform) = self.transform else {
            return Ok(None);
        };
        self.load(ArtifactKind::Original).await?;
        let Some(source) = self.slots.original.value().cloned() else {
            return Ok(None);
        };
        let rendered = self.ctx.renderer().render(source, &transform, height).await.or_raise(|| ErrorKind::Render)?;
        Ok(Some(Blob::from(rendered)))
    }

    async fn persist(&mut self, kind: ArtifactKind) -> Result<()> {
        let Slot::Changed { id: existing, value: Some(value) } = self.slots.get(kind) else {
            return Ok(());
        };
        let (existing, value) = (*existing, value.clone());
        let id = self.ctx.store().store_media(&value, existing).await.map_err(ErrorKind::store)?;
        tracing::trace!(record = ?self.id, %kind, media = %id, bytes = value.len(), "Artifact stored");
        self.slots.update(kind, |slot| slot.persisted(id));
        Ok(())
    }
}
