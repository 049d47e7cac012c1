//! Per-record artifact cache.
//!
//! A [`Record`] owns three cached artifacts (the original image, the edited
//! image and its thumbnail) and keeps them consistent with the record's
//! transform. Artifacts are fetched lazily from a
//! [`RecordStore`](darkroom_storage::RecordStore), derived lazily through a
//! [`Renderer`](darkroom_render::Renderer), and written back in dependency
//! order on [`Record::save`].
//!
//! ```no_run
//! use darkroom_config::Config;
//! use darkroom_library::{Context, Record};
//! use darkroom_render::Transform;
//!
//! # async fn run(photo: Vec<u8>) -> darkroom_library::error::Result<()> {
//! let ctx = Context::open(&Config::default()).await?;
//! let mut record = Record::new(ctx);
//! record.set_original(photo);
//! record.set_transform(Some(Transform { exposure: 0.5, ..Transform::default() }))?;
//! let id = record.save().await?;
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

mod context;
pub mod error;
mod record;
pub mod slot;

pub use crate::context::Context;
pub use crate::record::Record;
pub use crate::slot::{ArtifactKind, SlotState};
