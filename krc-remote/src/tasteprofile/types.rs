//! Taste profile wire types
//!
//! Every answer is wrapped as `{"response": {"status": {...}, ...}}`;
//! a non-zero status code means the call failed.

use krc_common::models::{ItemId, Song};
use serde::{Deserialize, Serialize};

/// Status code returned when the requested profile does not exist
pub const STATUS_DOES_NOT_EXIST: i64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseStatus {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Only the status block, used to check calls whose payload is ignored
#[derive(Debug, Clone, Deserialize)]
pub struct StatusOnly {
    pub status: ResponseStatus,
}

/// Summary of a profile as returned by `tasteprofile/profile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Number of items stored in the profile
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending_tickets: Vec<String>,
    #[serde(default)]
    pub resolved: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub status: ResponseStatus,
    pub catalog: Option<ProfileInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponse {
    pub status: ResponseStatus,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    pub status: ResponseStatus,
    pub ticket: Option<String>,
}

/// Progress of an update ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TicketStatus {
    #[serde(default)]
    pub ticket_status: String,
    #[serde(default)]
    pub items_updated: u64,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub percent_complete: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: ResponseStatus,
    #[serde(flatten)]
    pub ticket: TicketStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadCatalog {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadResponse {
    pub status: ResponseStatus,
    pub catalog: Option<ReadCatalog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForeignId {
    #[serde(default)]
    pub catalog: String,
    pub foreign_id: String,
}

/// One song of a generated playlist
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSong {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub foreign_ids: Vec<ForeignId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub songs: Vec<PlaylistSong>,
}

/// One `update` entry of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TasteItem {
    /// Local song id, as a string
    pub item_id: String,
    /// MusicBrainz reference, omitted when the song has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub song_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub artist_name: String,
    pub rating: u32,
    pub play_count: u32,
}

impl TasteItem {
    pub fn from_song(id: ItemId, song: &Song) -> Self {
        let song_id = if song.musicbrainz_track_id.is_empty() {
            None
        } else {
            Some(format!("musicbrainz:song:{}", song.musicbrainz_track_id))
        };

        Self {
            item_id: id.to_string(),
            song_id,
            song_name: song.title.clone(),
            artist_name: song.artist_line(),
            rating: song.rating,
            play_count: song.playcount,
        }
    }
}

/// Wrapper serialized as one command of the `data` form field
#[derive(Debug, Serialize)]
pub struct UpdateCommand<'a> {
    pub action: &'static str,
    pub item: &'a TasteItem,
}

impl<'a> UpdateCommand<'a> {
    pub fn update(item: &'a TasteItem) -> Self {
        Self {
            action: "update",
            item,
        }
    }
}

/// Foreign id under which the profile knows a local song
pub fn song_foreign_id(profile_id: &str, song_id: ItemId) -> String {
    format!("{}:song:{}", profile_id, song_id)
}

/// Map playlist songs back to local song ids
///
/// Songs without a foreign id from this profile are skipped.
pub fn playlist_song_ids(songs: &[PlaylistSong], profile_id: &str) -> Vec<ItemId> {
    let prefix = format!("{}:song:", profile_id);

    songs
        .iter()
        .filter_map(|song| {
            let id = song
                .foreign_ids
                .iter()
                .find_map(|f| f.foreign_id.strip_prefix(&prefix))
                .and_then(|rest| rest.parse::<ItemId>().ok());
            if id.is_none() {
                tracing::debug!(song = %song.id, title = %song.title, "Playlist song not in local library");
            }
            id
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_response_deserialization() {
        let body = json!({
            "response": {
                "status": {"code": 0, "message": "Success", "version": "4.2"},
                "catalog": {
                    "id": "CAABCD",
                    "name": "krc library",
                    "type": "general",
                    "total": 42,
                    "pending_tickets": [],
                    "resolved": 40
                }
            }
        });

        let parsed: Envelope<ProfileResponse> = serde_json::from_value(body).unwrap();
        let info = parsed.response.catalog.unwrap();
        assert_eq!(info.id, "CAABCD");
        assert_eq!(info.kind, "general");
        assert_eq!(info.total, 42);
    }

    #[test]
    fn test_missing_profile_has_no_catalog() {
        let body = json!({
            "response": {"status": {"code": 5, "message": "does not exist"}}
        });
        let parsed: Envelope<ProfileResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.response.status.code, STATUS_DOES_NOT_EXIST);
        assert!(parsed.response.catalog.is_none());
    }

    #[test]
    fn test_taste_item_from_song() {
        let song = Song {
            title: "Hey Jude".to_string(),
            artist: vec!["The Beatles".to_string()],
            rating: 4,
            playcount: 12,
            musicbrainz_track_id: "abc-123".to_string(),
            ..Default::default()
        };

        let item = TasteItem::from_song(7, &song);
        assert_eq!(item.item_id, "7");
        assert_eq!(item.song_id.as_deref(), Some("musicbrainz:song:abc-123"));

        let value = serde_json::to_value(UpdateCommand::update(&item)).unwrap();
        assert_eq!(value["action"], "update");
        assert_eq!(value["item"]["play_count"], 12);
        assert_eq!(value["item"]["rating"], 4);
    }

    #[test]
    fn test_taste_item_without_musicbrainz_id() {
        let item = TasteItem::from_song(3, &Song::default());
        assert!(item.song_id.is_none());

        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("song_id").is_none());
        assert!(value.get("song_name").is_none());
    }

    #[test]
    fn test_playlist_song_ids_strip_profile_prefix() {
        let body = json!({
            "response": {
                "status": {"code": 0, "message": "Success"},
                "songs": [
                    {"id": "SO1", "title": "A", "foreign_ids": [
                        {"catalog": "CAXYZ", "foreign_id": "CAXYZ:song:12"}
                    ]},
                    {"id": "SO2", "title": "B", "foreign_ids": []},
                    {"id": "SO3", "title": "C", "foreign_ids": [
                        {"catalog": "CAXYZ", "foreign_id": "CAXYZ:song:5"}
                    ]}
                ]
            }
        });

        let parsed: Envelope<PlaylistResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(playlist_song_ids(&parsed.response.songs, "CAXYZ"), vec![12, 5]);
    }

    #[test]
    fn test_song_foreign_id() {
        assert_eq!(song_foreign_id("CAXYZ", 12), "CAXYZ:song:12");
    }

    #[test]
    fn test_ticket_status_flattened() {
        let body = json!({
            "response": {
                "status": {"code": 0, "message": "Success"},
                "ticket_status": "complete",
                "items_updated": 25,
                "total_items": 25,
                "percent_complete": 100
            }
        });
        let parsed: Envelope<StatusResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.response.ticket.ticket_status, "complete");
        assert_eq!(parsed.response.ticket.percent_complete, 100);
    }
}
