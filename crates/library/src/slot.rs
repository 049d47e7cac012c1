//! Per-artifact cache state.
//!
//! Each of a record's three artifacts lives in a [`Slot`]. Slots are plain
//! values: every transition consumes the old state and returns the new one,
//! so the record only ever swaps whole states and no variant can end up
//! carrying data that isn't valid for it.
//!
//! ```text
//! NotLoaded --fetched (id present)-----> Loaded
//! NotLoaded --derived / set directly---> Changed
//! Loaded    --upstream change----------> OutOfDate
//! Loaded    --overwritten directly-----> Changed
//! Changed   --persisted----------------> Changed (id now backed)
//! OutOfDate --re-derived---------------> Changed
//! ```

use darkroom_storage::{Blob, MediaId};
use derive_more::Display;

/// Cache state of a single artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Nothing in memory. A persisted blob may exist under `id`.
    NotLoaded { id: Option<MediaId> },
    /// In memory and identical to the blob persisted under `id`.
    Loaded { id: MediaId, value: Blob },
    /// A write is pending. `value` is absent when there was nothing to set
    /// (a fresh record, or a derivation without a transform).
    Changed { id: Option<MediaId>, value: Option<Blob> },
    /// Derived from an original or transform that has since changed; must
    /// be derived again before it is used or persisted.
    OutOfDate { id: Option<MediaId>, value: Option<Blob> },
}
impl Default for Slot {
    fn default() -> Self {
        Self::NotLoaded { id: None }
    }
}

/// The state tag of a [`Slot`], without its data.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    #[display("not loaded")]
    NotLoaded,
    #[display("loaded")]
    Loaded,
    #[display("changed")]
    Changed,
    #[display("out of date")]
    OutOfDate,
}

impl Slot {
    /// Slot of a record that has never been persisted.
    pub fn fresh() -> Self {
        Self::Changed { id: None, value: None }
    }

    /// Slot of a record reconstructed from the store.
    pub fn stored(id: Option<MediaId>) -> Self {
        Self::NotLoaded { id }
    }

    /// The blob persisted under this slot's id has been fetched.
    pub fn loaded(self, value: Blob) -> Self {
        match self.id() {
            Some(id) => Self::Loaded { id, value },
            None => Self::Changed { id: None, value: Some(value) },
        }
    }

    /// The value has been overwritten directly. The id is kept, so the next
    /// save overwrites the persisted blob in place.
    pub fn changed(self, value: Blob) -> Self {
        Self::Changed { id: self.id(), value: Some(value) }
    }

    /// The value has been (re)derived from the current inputs.
    ///
    /// A derivation that yields nothing keeps the id, so the persisted blob
    /// is still deleted with the record and overwritten by the next value
    /// that is derived.
    pub fn derived(self, value: Option<Blob>) -> Self {
        Self::Changed { id: self.id(), value }
    }

    /// An input this slot is derived from has changed.
    pub fn invalidated(self) -> Self {
        match self {
            Self::NotLoaded { id } => Self::OutOfDate { id, value: None },
            Self::Loaded { id, value } => Self::OutOfDate { id: Some(id), value: Some(value) },
            Self::Changed { id, value } | Self::OutOfDate { id, value } => Self::OutOfDate { id, value },
        }
    }

    /// The pending value has been written under `id`. The slot stays
    /// [`Changed`](Self::Changed).
    pub fn persisted(self, id: MediaId) -> Self {
        match self {
            Self::Changed { value, .. } => Self::Changed { id: Some(id), value },
            other => other,
        }
    }

    pub fn id(&self) -> Option<MediaId> {
        match self {
            Self::NotLoaded { id } | Self::Changed { id, .. } | Self::OutOfDate { id, .. } => *id,
            Self::Loaded { id, .. } => Some(*id),
        }
    }

    pub fn value(&self) -> Option<&Blob> {
        match self {
            Self::NotLoaded { .. } => None,
            Self::Loaded { value, .. } => Some(value),
            Self::Changed { value, .. } | Self::OutOfDate { value, .. } => value.as_ref(),
        }
    }

    pub fn state(&self) -> SlotState {
        match self {
            Self::NotLoaded { .. } => SlotState::NotLoaded,
            Self::Loaded { .. } => SlotState::Loaded,
            Self::Changed { .. } => SlotState::Changed,
            Self::OutOfDate { .. } => SlotState::OutOfDate,
        }
    }

    /// `true` when the value can only come from the store.
    pub fn needs_fetch(&self) -> bool {
        matches!(self, Self::NotLoaded { id: Some(_) })
    }

    /// `true` when a derived artifact has to be (re)computed before use:
    /// it is stale, or there is neither a persisted blob nor a value.
    pub fn needs_derivation(&self) -> bool {
        match self {
            Self::OutOfDate { .. } => true,
            Self::NotLoaded { id } | Self::Changed { id, value: None } => id.is_none(),
            Self::Loaded { .. } | Self::Changed { .. } => false,
        }
    }
}

/// The three artifacts a record caches.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    #[display("original")]
    Original,
    #[display("edited")]
    Edited,
    #[display("thumbnail")]
    Thumbnail,
}

/// How an artifact's value is obtained from the record's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// The value is the input itself.
    Identity,
    /// The original rendered through the transform, scaled to fit the
    /// height if one is given.
    Render(Option<u32>),
}

impl ArtifactKind {
    /// Every artifact, in dependency order.
    pub const ALL: [Self; 3] = [Self::Original, Self::Edited, Self::Thumbnail];

    pub fn derivation(self, thumbnail_height: u32) -> Derivation {
        match self {
            Self::Original => Derivation::Identity,
            Self::Edited => Derivation::Render(None),
            Self::Thumbnail => Derivation::Render(Some(thumbnail_height)),
        }
    }
}

/// An input of the derived artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Original,
    Transform,
}
impl Change {
    /// The artifacts derived from this input.
    pub fn dependents(self) -> &'static [ArtifactKind] {
        match self {
            Self::Original | Self::Transform => &[ArtifactKind::Edited, ArtifactKind::Thumbnail],
        }
    }
}

/// All three slots of a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    pub original: Slot,
    pub edited: Slot,
    pub thumbnail: Slot,
}

impl Slots {
    pub fn fresh() -> Self {
        Self { original: Slot::fresh(), edited: Slot::fresh(), thumbnail: Slot::fresh() }
    }

    pub fn stored(original: Option<MediaId>, edited: Option<MediaId>, thumbnail: Option<MediaId>) -> Self {
        Self {
            original: Slot::stored(original),
            edited: Slot::stored(edited),
            thumbnail: Slot::stored(thumbnail),
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> &Slot {
        match kind {
            ArtifactKind::Original => &self.original,
            ArtifactKind::Edited => &self.edited,
            ArtifactKind::Thumbnail => &self.thumbnail,
        }
    }

    fn get_mut(&mut self, kind: ArtifactKind) -> &mut Slot {
        match kind {
            ArtifactKind::Original => &mut self.original,
            ArtifactKind::Edited => &mut self.edited,
            ArtifactKind::Thumbnail => &mut self.thumbnail,
        }
    }

    /// Replace one slot with the result of a transition.
    pub fn update(&mut self, kind: ArtifactKind, transition: impl FnOnce(Slot) -> Slot) {
        let slot = self.get_mut(kind);
        *slot = transition(std::mem::take(slot));
    }

    /// Ids of every persisted artifact, in dependency order.
    pub fn media_ids(&self) -> Vec<MediaId> {
        ArtifactKind::ALL.into_iter().filter_map(|kind| self.get(kind).id()).collect()
    }
}

/// Mark every artifact derived from `change` as out of date.
pub fn invalidate_dependents(mut slots: Slots, change: Change) -> Slots {
    for kind in change.dependents() {
        slots.update(*kind, Slot::invalidated);
    }
    slots
}
