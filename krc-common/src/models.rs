//! Library record models
//!
//! Typed records for the two synced collections (songs, albums) and the
//! [`Snapshot`] map that holds a local copy of a remote collection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of an item within its collection (Kodi `songid` / `albumid`)
pub type ItemId = u32;

/// Remote collections mirrored locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Songs,
    Albums,
}

impl ItemKind {
    /// Key under which the collection snapshot is persisted
    pub fn snapshot_key(&self) -> &'static str {
        match self {
            ItemKind::Songs => "songs",
            ItemKind::Albums => "albums",
        }
    }

    /// Name of the identifier field in Kodi responses
    pub fn id_field(&self) -> &'static str {
        match self {
            ItemKind::Songs => "songid",
            ItemKind::Albums => "albumid",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.snapshot_key())
    }
}

/// Persistence key of the genre index
pub const GENRES_KEY: &str = "genres";

/// Song record as stored in the local snapshot
///
/// The song identifier is the snapshot key, never a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub year: u32,
    /// Duration in seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub rating: u32,
    #[serde(default)]
    pub playcount: u32,
    #[serde(default)]
    pub musicbrainz_track_id: String,
    #[serde(default)]
    pub genre: Vec<String>,
    /// Rating last pushed to the taste profile
    #[serde(default)]
    pub synced_rating: u32,
    /// Play count last pushed to the taste profile
    #[serde(default)]
    pub synced_playcount: u32,
}

impl Song {
    /// True when rating or play count changed since the last taste profile push
    pub fn is_taste_pending(&self) -> bool {
        self.rating != self.synced_rating || self.playcount != self.synced_playcount
    }

    /// Record the current rating and play count as pushed
    pub fn mark_taste_synced(&mut self) {
        self.synced_rating = self.rating;
        self.synced_playcount = self.playcount;
    }

    /// Artists joined the way Kodi displays them
    pub fn artist_line(&self) -> String {
        self.artist.join("/")
    }
}

/// Album record as stored in the local snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub title: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub rating: u32,
    #[serde(default)]
    pub musicbrainz_album_id: String,
    /// Genre names, positionally matching `genre_ids`
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl Album {
    pub fn artist_line(&self) -> String {
        self.artist.join("/")
    }
}

/// Local copy of a remote collection, keyed by item identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot<T> {
    items: BTreeMap<ItemId, T>,
}

/// Genre id → genre name, derived from album records
pub type GenreIndex = Snapshot<String>;

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Insert or overwrite a record, returning the previous one
    pub fn insert(&mut self, id: ItemId, record: T) -> Option<T> {
        self.items.insert(id, record)
    }

    /// Identifiers in ascending order
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &T)> + '_ {
        self.items.iter().map(|(id, record)| (*id, record))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ItemId, &mut T)> + '_ {
        self.items.iter_mut().map(|(id, record)| (*id, record))
    }
}

impl<T> FromIterator<(ItemId, T)> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = (ItemId, T)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
