//! Song and album sync against the Kodi audio library
//!
//! Scan mode selection for songs:
//! - local snapshot size differs from the remote count → full scan
//! - sizes match → delta scan (rating and play count only)
//!
//! Equal counts do not prove equal item sets, so a delta scan also checks
//! identity: meeting an id the snapshot does not know, or not seeing every
//! stored id, discards the delta results and falls back to a full scan.

use super::pages::{pages, Page};
use super::{ensure_reachable, LibraryService, ScanMode, SyncError};
use krc_common::models::{Album, GenreIndex, ItemId, ItemKind, Snapshot, Song, GENRES_KEY};
use krc_common::store::{save_snapshot, SnapshotStore};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::genres::extract_genres;

/// Song sync tuning
#[derive(Debug, Clone)]
pub struct SongSyncOptions {
    pub page_size: usize,
    /// Skip scan mode selection and always re-fetch everything
    pub force_full: bool,
}

impl Default for SongSyncOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            force_full: false,
        }
    }
}

/// Outcome of a song sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSyncReport {
    pub mode: ScanMode,
    /// Remote item count at the start of the run
    pub total: usize,
    /// Page requests issued, including any discarded delta pass
    pub pages: usize,
    /// Songs whose rating changed (delta scans only)
    pub rating_changed: BTreeSet<ItemId>,
    /// Songs whose play count changed (delta scans only)
    pub playcount_changed: BTreeSet<ItemId>,
}

impl SongSyncReport {
    fn new(mode: ScanMode, total: usize) -> Self {
        Self {
            mode,
            total,
            pages: 0,
            rating_changed: BTreeSet::new(),
            playcount_changed: BTreeSet::new(),
        }
    }

    pub fn is_full_scan(&self) -> bool {
        self.mode == ScanMode::Full
    }
}

/// Outcome of an album sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSyncReport {
    pub mode: ScanMode,
    pub total: usize,
    pub pages: usize,
    /// Genre ids newly added to the genre index
    pub genres_added: usize,
}

/// Sync the song collection into `songs` and persist it
///
/// `songs` is replaced only after every page was fetched and the new
/// snapshot was saved; on error it is left as it was.
pub async fn sync_songs<L, S>(
    library: &L,
    store: &S,
    songs: &mut Snapshot<Song>,
    options: &SongSyncOptions,
) -> Result<SongSyncReport, SyncError>
where
    L: LibraryService + ?Sized,
    S: SnapshotStore + ?Sized,
{
    ensure_reachable(library).await?;

    let total = library.count(ItemKind::Songs).await?;
    debug!(total, "Total number of songs");

    if total == 0 {
        info!("Remote library has no songs, nothing to sync");
        return Ok(SongSyncReport::new(ScanMode::Skipped, 0));
    }

    let mut mode = if options.force_full || songs.len() != total {
        ScanMode::Full
    } else {
        ScanMode::Delta
    };
    info!(
        full_scan = mode == ScanMode::Full,
        local = songs.len(),
        remote = total,
        "Song scan mode selected"
    );

    let mut report = SongSyncReport::new(mode, total);

    let working = loop {
        match mode {
            ScanMode::Delta => {
                match delta_scan(library, songs, total, options.page_size, &mut report).await? {
                    Some(working) => break working,
                    None => {
                        report.rating_changed.clear();
                        report.playcount_changed.clear();
                        mode = ScanMode::Full;
                        report.mode = mode;
                    }
                }
            }
            _ => break full_song_scan(library, total, options.page_size, &mut report).await?,
        }
    };

    save_snapshot(store, ItemKind::Songs.snapshot_key(), &working).await?;
    *songs = working;

    info!(
        mode = %report.mode,
        songs = songs.len(),
        rating_changed = report.rating_changed.len(),
        playcount_changed = report.playcount_changed.len(),
        "Song sync complete"
    );

    Ok(report)
}

/// Re-fetch every song into a fresh snapshot
async fn full_song_scan<L>(
    library: &L,
    total: usize,
    page_size: usize,
    report: &mut SongSyncReport,
) -> Result<Snapshot<Song>, SyncError>
where
    L: LibraryService + ?Sized,
{
    let mut working = Snapshot::new();

    for page in pages(total, page_size) {
        log_page("songs", &page, total);
        let entries = library.fetch_songs(page.start, page.end).await?;
        report.pages += 1;
        check_page_len(&page, entries.len())?;

        for entry in entries {
            let (id, song) = entry.into_record();
            if working.insert(id, song).is_some() {
                return Err(listed_twice("song", id, &page));
            }
        }
    }

    Ok(working)
}

/// Apply remote rating and play count to a copy of `songs`
///
/// Returns `None` when the remote ids do not match the stored ones.
async fn delta_scan<L>(
    library: &L,
    songs: &Snapshot<Song>,
    total: usize,
    page_size: usize,
    report: &mut SongSyncReport,
) -> Result<Option<Snapshot<Song>>, SyncError>
where
    L: LibraryService + ?Sized,
{
    let mut working = songs.clone();
    let mut seen = BTreeSet::new();

    for page in pages(total, page_size) {
        log_page("songs", &page, total);
        let deltas = library.fetch_song_deltas(page.start, page.end).await?;
        report.pages += 1;
        check_page_len(&page, deltas.len())?;

        for delta in deltas {
            let Some(stored) = working.get_mut(delta.songid) else {
                warn!(
                    songid = delta.songid,
                    "Unknown song in delta scan, falling back to a full scan"
                );
                return Ok(None);
            };
            seen.insert(delta.songid);

            if stored.rating != delta.rating {
                stored.rating = delta.rating;
                info!(songid = delta.songid, rating = delta.rating, "Rating updated");
                report.rating_changed.insert(delta.songid);
            }
            if stored.playcount != delta.playcount {
                stored.playcount = delta.playcount;
                info!(songid = delta.songid, playcount = delta.playcount, "Play count updated");
                report.playcount_changed.insert(delta.songid);
            }
        }
    }

    if seen.len() != working.len() {
        warn!(
            missing = working.len() - seen.len(),
            "Stored songs absent from delta scan, falling back to a full scan"
        );
        return Ok(None);
    }

    Ok(Some(working))
}

/// Sync the album collection and derive new genres from it
///
/// Albums are always fully re-fetched. Both `albums` and `genres` are
/// replaced only once both were persisted.
pub async fn sync_albums<L, S>(
    library: &L,
    store: &S,
    albums: &mut Snapshot<Album>,
    genres: &mut GenreIndex,
    page_size: usize,
) -> Result<AlbumSyncReport, SyncError>
where
    L: LibraryService + ?Sized,
    S: SnapshotStore + ?Sized,
{
    ensure_reachable(library).await?;

    let total = library.count(ItemKind::Albums).await?;
    debug!(total, "Total number of albums");

    if total == 0 {
        info!("Remote library has no albums, nothing to sync");
        return Ok(AlbumSyncReport {
            mode: ScanMode::Skipped,
            total: 0,
            pages: 0,
            genres_added: 0,
        });
    }

    let mut working = Snapshot::new();
    let mut page_count = 0;

    for page in pages(total, page_size) {
        log_page("albums", &page, total);
        let entries = library.fetch_albums(page.start, page.end).await?;
        page_count += 1;
        check_page_len(&page, entries.len())?;

        for entry in entries {
            let (id, album) = entry.into_record();
            if working.insert(id, album).is_some() {
                return Err(listed_twice("album", id, &page));
            }
        }
    }

    let mut working_genres = genres.clone();
    let genres_added = extract_genres(&working, &mut working_genres);

    save_snapshot(store, ItemKind::Albums.snapshot_key(), &working).await?;
    save_snapshot(store, GENRES_KEY, &working_genres).await?;
    *albums = working;
    *genres = working_genres;

    info!(
        albums = albums.len(),
        genres = genres.len(),
        genres_added,
        "Album sync complete"
    );

    Ok(AlbumSyncReport {
        mode: ScanMode::Full,
        total,
        pages: page_count,
        genres_added,
    })
}

fn log_page(collection: &str, page: &Page, total: usize) {
    info!(
        collection,
        page = page.index,
        start = page.start,
        end = page.end,
        total,
        "Processing page"
    );
}

/// A repeated id means another id of `[0, N)` was never listed
fn listed_twice(kind: &str, id: ItemId, page: &Page) -> SyncError {
    SyncError::Protocol(format!(
        "{} {} listed twice (page [{}, {})), library changed during the scan",
        kind, id, page.start, page.end
    ))
}

/// A page must hold exactly the requested number of items
fn check_page_len(page: &Page, received: usize) -> Result<(), SyncError> {
    if received == page.len() {
        Ok(())
    } else {
        Err(SyncError::Protocol(format!(
            "page [{}, {}) returned {} items, expected {}",
            page.start,
            page.end,
            received,
            page.len()
        )))
    }
}
