//! Kodi JSON-RPC client
//!
//! Talks to the Kodi web server over HTTP (`POST /jsonrpc`) with basic
//! authentication. Audio playlist and audio player both use id 0.

pub mod rpc;
pub mod types;

use crate::sync::LibraryService;
use async_trait::async_trait;
use krc_common::config::ServerConfig;
use krc_common::models::{ItemId, ItemKind};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use self::rpc::{RpcRequest, RpcResponse};
use self::types::{
    ActivePlayer, AlbumEntry, AlbumsResult, LimitsOnly, PlayerItem, PlayerItemResult,
    PlayerProperties, PlaylistItem, PlaylistItemsResult, SongDelta, SongDeltasResult, SongEntry,
    SongsResult, ALBUM_PROPERTIES, SONG_DELTA_PROPERTIES, SONG_FULL_PROPERTIES,
};

const USER_AGENT: &str = concat!("krc-remote/", env!("CARGO_PKG_VERSION"));
const AUDIO_PLAYLIST_ID: u32 = 0;
const AUDIO_PLAYER_ID: u32 = 0;

/// Kodi client errors
#[derive(Debug, Error)]
pub enum KodiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication rejected by Kodi")]
    Unauthorized,

    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    #[error("{method} failed with JSON-RPC error {code}: {message}")]
    RpcError {
        method: String,
        code: i64,
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected response to {method}: {detail}")]
    Protocol { method: String, detail: String },
}

/// Kodi JSON-RPC client
pub struct KodiClient {
    http_client: reqwest::Client,
    url: String,
    user: String,
    password: String,
    next_id: AtomicU64,
}

impl KodiClient {
    pub fn new(server: &ServerConfig) -> Result<Self, KodiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KodiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: server.jsonrpc_url(),
            user: server.user.clone(),
            password: server.password.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and decode its `result`
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, KodiError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);

        tracing::debug!(method, id, url = %self.url, "Calling Kodi");

        let response = self
            .http_client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| KodiError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(KodiError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(KodiError::HttpError(status.as_u16(), error_text));
        }

        let body: RpcResponse = response.json().await.map_err(|e| KodiError::Protocol {
            method: method.to_string(),
            detail: e.to_string(),
        })?;

        if let Some(error) = body.error {
            tracing::warn!(method, code = error.code, message = %error.message, "Kodi returned an error");
            return Err(KodiError::RpcError {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        let result = body.result.ok_or_else(|| KodiError::Protocol {
            method: method.to_string(),
            detail: "missing result".to_string(),
        })?;

        serde_json::from_value(result).map_err(|e| KodiError::Protocol {
            method: method.to_string(),
            detail: e.to_string(),
        })
    }

    /// Call a method whose result is the plain string "OK"
    async fn call_ok(&self, method: &str, params: Option<Value>) -> Result<(), KodiError> {
        let result: Value = self.call(method, params).await?;
        tracing::debug!(method, result = %result, "Command processed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    /// `JSONRPC.Ping`, any failure means unreachable
    pub async fn ping(&self) -> bool {
        match self.call::<String>("JSONRPC.Ping", None).await {
            Ok(reply) => reply == "pong",
            Err(e) => {
                tracing::debug!(error = %e, "Ping failed");
                false
            }
        }
    }

    pub async fn friendly_name(&self) -> Result<String, KodiError> {
        let mut labels: HashMap<String, String> = self
            .call(
                "XBMC.GetInfoLabels",
                Some(json!({"labels": ["System.FriendlyName"]})),
            )
            .await?;
        labels
            .remove("System.FriendlyName")
            .ok_or_else(|| KodiError::Protocol {
                method: "XBMC.GetInfoLabels".to_string(),
                detail: "System.FriendlyName missing".to_string(),
            })
    }

    pub async fn set_volume(&self, volume: u8) -> Result<(), KodiError> {
        self.call_ok("Application.SetVolume", Some(json!({"volume": volume})))
            .await
    }

    // ------------------------------------------------------------------
    // Audio library
    // ------------------------------------------------------------------

    fn list_method(kind: ItemKind) -> &'static str {
        match kind {
            ItemKind::Songs => "AudioLibrary.GetSongs",
            ItemKind::Albums => "AudioLibrary.GetAlbums",
        }
    }

    /// Total number of items, read from the limits of a one-item listing
    pub async fn library_count(&self, kind: ItemKind) -> Result<usize, KodiError> {
        let result: LimitsOnly = self
            .call(
                Self::list_method(kind),
                Some(json!({"limits": {"start": 0, "end": 1}})),
            )
            .await?;
        Ok(result.limits.total)
    }

    pub async fn songs_full(&self, start: usize, end: usize) -> Result<Vec<SongEntry>, KodiError> {
        let result: SongsResult = self
            .call(
                "AudioLibrary.GetSongs",
                Some(json!({
                    "properties": SONG_FULL_PROPERTIES,
                    "limits": {"start": start, "end": end},
                })),
            )
            .await?;
        Ok(result.songs)
    }

    pub async fn songs_delta(&self, start: usize, end: usize) -> Result<Vec<SongDelta>, KodiError> {
        let result: SongDeltasResult = self
            .call(
                "AudioLibrary.GetSongs",
                Some(json!({
                    "properties": SONG_DELTA_PROPERTIES,
                    "limits": {"start": start, "end": end},
                })),
            )
            .await?;
        Ok(result.songs)
    }

    pub async fn albums(&self, start: usize, end: usize) -> Result<Vec<AlbumEntry>, KodiError> {
        let result: AlbumsResult = self
            .call(
                "AudioLibrary.GetAlbums",
                Some(json!({
                    "properties": ALBUM_PROPERTIES,
                    "limits": {"start": start, "end": end},
                })),
            )
            .await?;
        Ok(result.albums)
    }

    // ------------------------------------------------------------------
    // Playlist
    // ------------------------------------------------------------------

    pub async fn playlist_add(&self, kind: ItemKind, id: ItemId) -> Result<(), KodiError> {
        let mut item = serde_json::Map::new();
        item.insert(kind.id_field().to_string(), json!(id));
        self.call_ok(
            "Playlist.Add",
            Some(json!({"playlistid": AUDIO_PLAYLIST_ID, "item": item})),
        )
        .await
    }

    pub async fn playlist_add_songs(&self, ids: &[ItemId]) -> Result<(), KodiError> {
        for id in ids {
            self.playlist_add(ItemKind::Songs, *id).await?;
        }
        Ok(())
    }

    pub async fn playlist_add_albums(&self, ids: &[ItemId]) -> Result<(), KodiError> {
        for id in ids {
            self.playlist_add(ItemKind::Albums, *id).await?;
        }
        Ok(())
    }

    pub async fn playlist_clear(&self) -> Result<(), KodiError> {
        self.call_ok("Playlist.Clear", Some(json!({"playlistid": AUDIO_PLAYLIST_ID})))
            .await
    }

    pub async fn playlist_items(&self) -> Result<Vec<PlaylistItem>, KodiError> {
        let result: PlaylistItemsResult = self
            .call(
                "Playlist.GetItems",
                Some(json!({"playlistid": AUDIO_PLAYLIST_ID, "properties": ["artist"]})),
            )
            .await?;
        Ok(result.items)
    }

    // ------------------------------------------------------------------
    // Player
    // ------------------------------------------------------------------

    pub async fn active_players(&self) -> Result<Vec<ActivePlayer>, KodiError> {
        self.call("Player.GetActivePlayers", None).await
    }

    pub async fn player_is_active(&self) -> Result<bool, KodiError> {
        Ok(!self.active_players().await?.is_empty())
    }

    pub async fn player_item(&self) -> Result<PlayerItem, KodiError> {
        let result: PlayerItemResult = self
            .call(
                "Player.GetItem",
                Some(json!({
                    "playerid": AUDIO_PLAYER_ID,
                    "properties": ["artist", "album", "year", "rating"],
                })),
            )
            .await?;
        Ok(result.item)
    }

    pub async fn player_properties(&self) -> Result<PlayerProperties, KodiError> {
        self.call(
            "Player.GetProperties",
            Some(json!({
                "playerid": AUDIO_PLAYER_ID,
                "properties": ["time", "totaltime", "percentage", "position"],
            })),
        )
        .await
    }

    pub async fn player_goto_next(&self) -> Result<(), KodiError> {
        self.call_ok(
            "Player.GoTo",
            Some(json!({"playerid": AUDIO_PLAYER_ID, "to": "next"})),
        )
        .await
    }

    pub async fn player_open_playlist(&self) -> Result<(), KodiError> {
        self.call_ok(
            "Player.Open",
            Some(json!({"item": {"playlistid": AUDIO_PLAYLIST_ID}})),
        )
        .await
    }

    pub async fn player_open_party(&self) -> Result<(), KodiError> {
        self.call_ok("Player.Open", Some(json!({"item": {"partymode": "music"}})))
            .await
    }

    pub async fn player_play_pause(&self) -> Result<(), KodiError> {
        self.call_ok("Player.PlayPause", Some(json!({"playerid": AUDIO_PLAYER_ID})))
            .await
    }

    pub async fn player_stop(&self) -> Result<(), KodiError> {
        self.call_ok("Player.Stop", Some(json!({"playerid": AUDIO_PLAYER_ID})))
            .await
    }

    /// Toggle play/pause, opening the audio playlist when no player is active
    pub async fn playback_start(&self) -> Result<(), KodiError> {
        if self.player_is_active().await? {
            self.player_play_pause().await
        } else {
            tracing::info!("No active player, opening the audio playlist");
            self.player_open_playlist().await
        }
    }

    /// Stop playback if a player is active
    pub async fn playback_stop(&self) -> Result<(), KodiError> {
        if self.player_is_active().await? {
            self.player_stop().await
        } else {
            tracing::debug!("No active player, nothing to stop");
            Ok(())
        }
    }
}

#[async_trait]
impl LibraryService for KodiClient {
    async fn ping(&self) -> bool {
        KodiClient::ping(self).await
    }

    async fn count(&self, kind: ItemKind) -> Result<usize, KodiError> {
        self.library_count(kind).await
    }

    async fn fetch_songs(&self, start: usize, end: usize) -> Result<Vec<SongEntry>, KodiError> {
        self.songs_full(start, end).await
    }

    async fn fetch_song_deltas(
        &self,
        start: usize,
        end: usize,
    ) -> Result<Vec<SongDelta>, KodiError> {
        self.songs_delta(start, end).await
    }

    async fn fetch_albums(&self, start: usize, end: usize) -> Result<Vec<AlbumEntry>, KodiError> {
        self.albums(start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = KodiClient::new(&ServerConfig::default());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().url(), "http://localhost:8080/jsonrpc");
    }

    #[tokio::test]
    async fn test_ping_unreachable_server_is_false() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..Default::default()
        };
        let client = KodiClient::new(&server).unwrap();
        assert!(!client.ping().await);
    }
}
