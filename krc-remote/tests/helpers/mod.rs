//! Test Helper Utilities
//!
//! In-process stand-ins for the Kodi library, the taste profile service
//! and the pacer, recording every call the sync engine makes.

#![allow(dead_code)]

use async_trait::async_trait;
use krc_common::models::{ItemId, ItemKind};
use krc_remote::kodi::types::{AlbumEntry, SongDelta, SongEntry};
use krc_remote::kodi::KodiError;
use krc_remote::sync::{LibraryService, Pacer, TasteProfileService};
use krc_remote::tasteprofile::types::{ProfileInfo, TasteItem};
use krc_remote::tasteprofile::TasteProfileError;
use std::sync::Mutex;
use std::time::Duration;

/// Listing call seen by [`FakeLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Songs(usize, usize),
    Deltas(usize, usize),
    Albums(usize, usize),
}

/// Remote library held in memory, in remote listing order
#[derive(Default)]
pub struct FakeLibrary {
    pub songs: Vec<SongEntry>,
    pub albums: Vec<AlbumEntry>,
    pub unreachable: bool,
    /// Fail the n-th listing call (0-indexed)
    pub fail_on_fetch: Option<usize>,
    /// Drop the last item of every page
    pub short_pages: bool,
    fetches: Mutex<Vec<Fetch>>,
}

impl FakeLibrary {
    pub fn with_songs(songs: Vec<SongEntry>) -> Self {
        Self {
            songs,
            ..Default::default()
        }
    }

    pub fn with_albums(albums: Vec<AlbumEntry>) -> Self {
        Self {
            albums,
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> Vec<Fetch> {
        self.fetches.lock().unwrap().clone()
    }

    fn record(&self, fetch: Fetch) -> Result<(), KodiError> {
        let mut fetches = self.fetches.lock().unwrap();
        let index = fetches.len();
        fetches.push(fetch);
        if self.fail_on_fetch == Some(index) {
            return Err(KodiError::NetworkError("connection reset".to_string()));
        }
        Ok(())
    }

    fn window<T: Clone>(&self, items: &[T], start: usize, end: usize) -> Vec<T> {
        let end = end.min(items.len());
        let start = start.min(end);
        let mut page = items[start..end].to_vec();
        if self.short_pages {
            page.pop();
        }
        page
    }
}

#[async_trait]
impl LibraryService for FakeLibrary {
    async fn ping(&self) -> bool {
        !self.unreachable
    }

    async fn count(&self, kind: ItemKind) -> Result<usize, KodiError> {
        Ok(match kind {
            ItemKind::Songs => self.songs.len(),
            ItemKind::Albums => self.albums.len(),
        })
    }

    async fn fetch_songs(&self, start: usize, end: usize) -> Result<Vec<SongEntry>, KodiError> {
        self.record(Fetch::Songs(start, end))?;
        Ok(self.window(&self.songs, start, end))
    }

    async fn fetch_song_deltas(
        &self,
        start: usize,
        end: usize,
    ) -> Result<Vec<SongDelta>, KodiError> {
        self.record(Fetch::Deltas(start, end))?;
        Ok(self
            .window(&self.songs, start, end)
            .into_iter()
            .map(|s| SongDelta {
                songid: s.songid,
                rating: s.rating,
                playcount: s.playcount,
            })
            .collect())
    }

    async fn fetch_albums(&self, start: usize, end: usize) -> Result<Vec<AlbumEntry>, KodiError> {
        self.record(Fetch::Albums(start, end))?;
        Ok(self.window(&self.albums, start, end))
    }
}

pub fn song_entry(songid: ItemId, rating: u32, playcount: u32) -> SongEntry {
    SongEntry {
        songid,
        title: format!("Song {}", songid),
        artist: vec![format!("Artist {}", songid % 7)],
        year: 1990 + songid % 30,
        duration: 180 + songid,
        rating,
        playcount,
        musicbrainztrackid: format!("mbid-{}", songid),
        genre: vec!["Rock".to_string()],
    }
}

/// Songs with ids `1..=count`
pub fn song_entries(count: u32) -> Vec<SongEntry> {
    (1..=count).map(|id| song_entry(id, id % 6, id * 2)).collect()
}

pub fn album_entry(albumid: ItemId, genreid: &[u32], genre: &[&str]) -> AlbumEntry {
    AlbumEntry {
        albumid,
        title: format!("Album {}", albumid),
        artist: vec!["Artist".to_string()],
        year: 2000,
        rating: 0,
        musicbrainzalbumid: String::new(),
        genre: genre.iter().map(|g| g.to_string()).collect(),
        genreid: genreid.to_vec(),
    }
}

/// Taste profile service held in memory
#[derive(Default)]
pub struct FakeTasteProfile {
    /// Items the profile reports holding
    pub total: u64,
    /// Fail the n-th update call (0-indexed)
    pub fail_on_update: Option<usize>,
    updates: Mutex<Vec<Vec<TasteItem>>>,
}

impl FakeTasteProfile {
    pub fn with_total(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn failing_on_update(total: u64, index: usize) -> Self {
        Self {
            total,
            fail_on_update: Some(index),
            ..Default::default()
        }
    }

    pub fn updates(&self) -> Vec<Vec<TasteItem>> {
        self.updates.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.updates().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl TasteProfileService for FakeTasteProfile {
    async fn profile(&self, profile_id: &str) -> Result<ProfileInfo, TasteProfileError> {
        Ok(ProfileInfo {
            id: profile_id.to_string(),
            name: "krc library".to_string(),
            kind: "general".to_string(),
            total: self.total,
            ..Default::default()
        })
    }

    async fn update(
        &self,
        _profile_id: &str,
        items: &[TasteItem],
    ) -> Result<String, TasteProfileError> {
        let mut updates = self.updates.lock().unwrap();
        let index = updates.len();
        if self.fail_on_update == Some(index) {
            return Err(TasteProfileError::ApiError(503, "rate limited".to_string()));
        }
        updates.push(items.to_vec());
        Ok(format!("ticket-{}", index))
    }
}

/// Pacer that records requested pauses without waiting
#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(delay);
    }
}
