//! Kodi response types
//!
//! Records are validated here, at the deserialization boundary, and then
//! converted into the typed snapshot records of `krc_common::models`.

use krc_common::models::{Album, ItemId, Song};
use serde::{Deserialize, Deserializer};

/// Song properties requested for a full scan
pub const SONG_FULL_PROPERTIES: &[&str] = &[
    "title",
    "artist",
    "year",
    "duration",
    "rating",
    "playcount",
    "musicbrainztrackid",
    "genre",
];

/// Song properties requested for a delta scan
pub const SONG_DELTA_PROPERTIES: &[&str] = &["rating", "playcount"];

pub const ALBUM_PROPERTIES: &[&str] = &[
    "title",
    "artist",
    "year",
    "rating",
    "musicbrainzalbumid",
    "genre",
    "genreid",
];

/// Kodi reports ratings as integers (0-5) or floats (0-10) depending on version
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!("invalid rating {}", value)));
    }
    Ok(value.round() as u32)
}

/// Result window returned with every library listing
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    pub total: usize,
}

/// One song of an `AudioLibrary.GetSongs` full listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongEntry {
    pub songid: ItemId,
    pub title: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub duration: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub rating: u32,
    #[serde(default)]
    pub playcount: u32,
    #[serde(default)]
    pub musicbrainztrackid: String,
    #[serde(default)]
    pub genre: Vec<String>,
}

impl SongEntry {
    /// Split into snapshot key and record, taste profile fields reset
    pub fn into_record(self) -> (ItemId, Song) {
        (
            self.songid,
            Song {
                title: self.title,
                artist: self.artist,
                year: self.year,
                duration: self.duration,
                rating: self.rating,
                playcount: self.playcount,
                musicbrainz_track_id: self.musicbrainztrackid,
                genre: self.genre,
                synced_rating: 0,
                synced_playcount: 0,
            },
        )
    }
}

/// One song of an `AudioLibrary.GetSongs` delta listing
///
/// Both mutable fields are required; a listing without them is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SongDelta {
    pub songid: ItemId,
    #[serde(deserialize_with = "lenient_u32")]
    pub rating: u32,
    pub playcount: u32,
}

/// One album of an `AudioLibrary.GetAlbums` listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlbumEntry {
    pub albumid: ItemId,
    pub title: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub year: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub rating: u32,
    #[serde(default)]
    pub musicbrainzalbumid: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub genreid: Vec<u32>,
}

impl AlbumEntry {
    pub fn into_record(self) -> (ItemId, Album) {
        (
            self.albumid,
            Album {
                title: self.title,
                artist: self.artist,
                year: self.year,
                rating: self.rating,
                musicbrainz_album_id: self.musicbrainzalbumid,
                genre: self.genre,
                genre_ids: self.genreid,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SongsResult {
    pub limits: Limits,
    #[serde(default)]
    pub songs: Vec<SongEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SongDeltasResult {
    pub limits: Limits,
    #[serde(default)]
    pub songs: Vec<SongDelta>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumsResult {
    pub limits: Limits,
    #[serde(default)]
    pub albums: Vec<AlbumEntry>,
}

/// `AudioLibrary.GetSongs` / `GetAlbums` called with limits only
#[derive(Debug, Deserialize)]
pub struct LimitsOnly {
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivePlayer {
    pub playerid: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Entry of the audio playlist
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub artist: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemsResult {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

/// Item currently played by the audio player
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub year: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub rating: u32,
}

#[derive(Debug, Deserialize)]
pub struct PlayerItemResult {
    pub item: PlayerItem,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlayerTime {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl std::fmt::Display for PlayerTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hours > 0 {
            write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
        } else {
            write!(f, "{}:{:02}", self.minutes, self.seconds)
        }
    }
}

/// `Player.GetProperties` for time, totaltime, percentage and position
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerProperties {
    #[serde(default)]
    pub time: PlayerTime,
    #[serde(default)]
    pub totaltime: PlayerTime,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub position: i64,
}
