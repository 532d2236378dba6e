//! Queries over the local snapshots

use krc_common::models::{Album, ItemId, Snapshot, Song};
use rand::seq::IteratorRandom;

/// Songs whose title or artists contain `needle`, case-insensitive
pub fn search_songs(songs: &Snapshot<Song>, needle: &str) -> Vec<ItemId> {
    let needle = needle.to_lowercase();
    songs
        .iter()
        .filter(|(_, song)| {
            song.title.to_lowercase().contains(&needle)
                || song.artist_line().to_lowercase().contains(&needle)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Albums whose title or artists contain `needle`, case-insensitive
pub fn search_albums(albums: &Snapshot<Album>, needle: &str) -> Vec<ItemId> {
    let needle = needle.to_lowercase();
    albums
        .iter()
        .filter(|(_, album)| {
            album.title.to_lowercase().contains(&needle)
                || album.artist_line().to_lowercase().contains(&needle)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Up to `count` distinct ids picked at random, sorted
pub fn random_ids<T>(snapshot: &Snapshot<T>, count: usize) -> Vec<ItemId> {
    let mut picked = snapshot.ids().choose_multiple(&mut rand::thread_rng(), count);
    picked.sort_unstable();
    picked
}
