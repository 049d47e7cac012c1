//! SQLite record and media store.
//!
//! This crate provides the persistent [`RecordStore`](darkroom_storage::RecordStore)
//! implementation used outside of tests. Records and their media blobs live
//! in the same SQLite database, so deleting a record together with its blobs
//! happens inside a single transaction.
//!
//! # Architecture
//! The database stores two entity types:
//! - **Media**: encoded image bytes, addressed by an auto-incrementing id.
//!   Writing to an existing id overwrites the blob in place.
//! - **Records**: identity, transform (as JSON text), sync flags, and
//!   nullable references to the original, edited and thumbnail media.

mod db;
pub mod error;
mod models;
mod store;

pub use crate::db::Database;
pub use crate::store::SqliteStore;
