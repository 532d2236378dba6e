//! Push local rating and play count changes to the taste profile
//!
//! An empty profile receives every local song. Otherwise only songs whose
//! rating or play count moved since their last push are sent. Songs go out
//! in fixed-size batches with a pause between batches.

use super::pacing::Pacer;
use super::{ScanMode, SyncError, TasteProfileService};
use crate::tasteprofile::types::TasteItem;
use krc_common::models::{ItemId, ItemKind, Snapshot, Song};
use krc_common::store::{save_snapshot, SnapshotStore};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Taste sync tuning
#[derive(Debug, Clone)]
pub struct TasteSyncOptions {
    /// Songs per update call
    pub batch_size: usize,
    /// Wait between two update calls
    pub pause: Duration,
}

impl Default for TasteSyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 25,
            pause: Duration::from_millis(510),
        }
    }
}

/// Outcome of a taste sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasteSyncReport {
    /// `Full` when the profile was empty, `Delta` otherwise
    pub mode: ScanMode,
    /// Songs pushed, in push order
    pub pushed: Vec<ItemId>,
    pub batches: usize,
    /// Update tickets, one per batch
    pub tickets: Vec<String>,
}

/// Push pending songs of `songs` to the profile `profile_id`
///
/// Pushed songs are marked synced in `songs`. The snapshot is saved once at
/// the end, or before returning the error when a batch fails, so a rerun
/// only sends what is still pending.
pub async fn sync_taste_profile<T, S, P>(
    taste: &T,
    store: &S,
    pacer: &P,
    profile_id: &str,
    songs: &mut Snapshot<Song>,
    options: &TasteSyncOptions,
) -> Result<TasteSyncReport, SyncError>
where
    T: TasteProfileService + ?Sized,
    S: SnapshotStore + ?Sized,
    P: Pacer + ?Sized,
{
    let profile = taste.profile(profile_id).await?;

    let (mode, pending): (ScanMode, Vec<ItemId>) = if profile.total == 0 {
        info!(profile_id, "Taste profile is empty, pushing every song");
        (ScanMode::Full, songs.ids().collect())
    } else {
        let pending = songs
            .iter()
            .filter(|(_, song)| song.is_taste_pending())
            .map(|(id, _)| id)
            .collect();
        (ScanMode::Delta, pending)
    };

    debug!(pending = pending.len(), ?mode, "Songs to push");

    let mut report = TasteSyncReport {
        mode,
        pushed: Vec::with_capacity(pending.len()),
        batches: 0,
        tickets: Vec::new(),
    };

    if pending.is_empty() {
        info!("No taste profile changes to push");
        return Ok(report);
    }

    let batch_size = options.batch_size.max(1);
    let batch_count = pending.len().div_ceil(batch_size);

    for (index, batch) in pending.chunks(batch_size).enumerate() {
        if index > 0 {
            pacer.pause(options.pause).await;
        }

        info!(
            batch = index,
            of = batch_count,
            songs = batch.len(),
            "Pushing taste profile batch"
        );

        let items: Vec<TasteItem> = batch
            .iter()
            .filter_map(|&id| songs.get(id).map(|song| TasteItem::from_song(id, song)))
            .collect();

        let ticket = match taste.update(profile_id, &items).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(
                    batch = index,
                    pushed = report.pushed.len(),
                    error = %e,
                    "Taste profile batch failed, saving progress"
                );
                if !report.pushed.is_empty() {
                    save_snapshot(store, ItemKind::Songs.snapshot_key(), &*songs).await?;
                }
                return Err(e.into());
            }
        };

        for &id in batch {
            if let Some(song) = songs.get_mut(id) {
                song.mark_taste_synced();
            }
        }
        report.pushed.extend_from_slice(batch);
        report.tickets.push(ticket);
        report.batches += 1;
    }

    save_snapshot(store, ItemKind::Songs.snapshot_key(), &*songs).await?;

    info!(
        pushed = report.pushed.len(),
        batches = report.batches,
        "Taste profile sync complete"
    );

    Ok(report)
}
