//! Library sync engine
//!
//! Mirrors the Kodi audio library into local snapshots and pushes rating
//! and play count changes to the taste profile service.
//!
//! Every entry point works on a snapshot owned by the caller through
//! `&mut`. Library syncs merge into a working copy and only commit it once
//! the whole collection was fetched and persisted, so a failed run leaves
//! both the caller's snapshot and the stored copy untouched.

pub mod genres;
pub mod library;
pub mod pacing;
pub mod pages;
pub mod taste;

pub use genres::extract_genres;
pub use library::{sync_albums, sync_songs, AlbumSyncReport, SongSyncOptions, SongSyncReport};
pub use pacing::{Pacer, TokioPacer};
pub use pages::{pages, Page};
pub use taste::{sync_taste_profile, TasteSyncOptions, TasteSyncReport};

use crate::kodi::types::{AlbumEntry, SongDelta, SongEntry};
use crate::kodi::KodiError;
use crate::tasteprofile::types::{ProfileInfo, TasteItem};
use crate::tasteprofile::TasteProfileError;
use async_trait::async_trait;
use krc_common::models::ItemKind;
use thiserror::Error;

/// Remote library consumed by the sync engine
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// Lightweight reachability probe
    async fn ping(&self) -> bool;

    /// Total number of items in a collection
    async fn count(&self, kind: ItemKind) -> Result<usize, KodiError>;

    /// Songs in `[start, end)` with every stored property
    async fn fetch_songs(&self, start: usize, end: usize) -> Result<Vec<SongEntry>, KodiError>;

    /// Songs in `[start, end)` with rating and play count only
    async fn fetch_song_deltas(&self, start: usize, end: usize)
        -> Result<Vec<SongDelta>, KodiError>;

    /// Albums in `[start, end)`
    async fn fetch_albums(&self, start: usize, end: usize) -> Result<Vec<AlbumEntry>, KodiError>;
}

/// Taste profile operations consumed by the sync engine
#[async_trait]
pub trait TasteProfileService: Send + Sync {
    async fn profile(&self, profile_id: &str) -> Result<ProfileInfo, TasteProfileError>;

    /// Push one batch of updates, returning the service ticket
    async fn update(&self, profile_id: &str, items: &[TasteItem])
        -> Result<String, TasteProfileError>;
}

/// How a collection was refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Every field of every item re-fetched
    Full,
    /// Only rating and play count re-fetched
    Delta,
    /// Remote collection empty, nothing fetched
    Skipped,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScanMode::Full => "full",
            ScanMode::Delta => "delta",
            ScanMode::Skipped => "skipped",
        })
    }
}

/// Sync engine errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Kodi server is unreachable")]
    Unreachable,

    #[error("Kodi error: {0}")]
    Library(#[from] KodiError),

    #[error("Taste profile error: {0}")]
    TasteProfile(#[from] TasteProfileError),

    /// A page did not match what was requested
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Storage error: {0}")]
    Store(#[from] krc_common::Error),
}

/// Fail fast before touching any state when the remote does not answer
pub(crate) async fn ensure_reachable<L>(library: &L) -> Result<(), SyncError>
where
    L: LibraryService + ?Sized,
{
    if library.ping().await {
        Ok(())
    } else {
        tracing::error!("Kodi server did not answer ping, sync aborted");
        Err(SyncError::Unreachable)
    }
}
