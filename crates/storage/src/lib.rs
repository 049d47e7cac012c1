//! Store interface for darkroom records and their media blobs.
//!
//! A record is a small metadata row (identity, transform, sync flags) that
//! references up to three media blobs: the original image, the edited image
//! and the thumbnail. This crate defines the [`RecordStore`] trait that the
//! library persists through, the plain [`StoredRecord`] wire format, and a
//! couple of store implementations that don't need a database.

pub mod backend;
pub mod error;
mod models;

pub use crate::backend::RecordStore;
pub use crate::models::{Blob, MediaId, RecordId, StoredRecord, TransformMap};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn RecordStore + Send + Sync>;
