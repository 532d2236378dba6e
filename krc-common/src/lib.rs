//! # KRC Common Library
//!
//! Shared code for the Kodi remote controller including:
//! - Library record models and snapshots
//! - Snapshot persistence (store trait, SQLite database)
//! - Configuration loading and root folder resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use error::{Error, Result};
pub use models::{Album, GenreIndex, ItemId, ItemKind, Snapshot, Song};
pub use store::{MemorySnapshotStore, SnapshotStore};
