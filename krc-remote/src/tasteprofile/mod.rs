//! Taste profile API client
//!
//! Echo Nest style web API holding a per-user record of song ratings and
//! play counts, used to generate playlists from the local library.
//!
//! Reads are `GET` with query parameters, writes are form `POST`s. The
//! service accepts about two requests per second; callers pace batches
//! through [`crate::sync::Pacer`].

pub mod types;

use crate::sync::TasteProfileService;
use async_trait::async_trait;
use krc_common::db::settings;
use krc_common::models::ItemId;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::time::Duration;
use thiserror::Error;

use self::types::{
    song_foreign_id, CreateResponse, Envelope, PlaylistResponse, PlaylistSong, ProfileInfo,
    ProfileResponse, ReadResponse, ResponseStatus, StatusOnly, StatusResponse, TasteItem,
    TicketStatus, UpdateCommand, UpdateResponse, STATUS_DOES_NOT_EXIST,
};

const USER_AGENT: &str = concat!("krc-remote/", env!("CARGO_PKG_VERSION"));

/// Buckets requested when reading a single item
const READ_BUCKETS: [&str; 6] = [
    "artist_discovery",
    "artist_familiarity",
    "artist_hotttnesss",
    "song_currency",
    "song_hotttnesss",
    "song_type",
];

/// Taste profile client errors
#[derive(Debug, Error)]
pub enum TasteProfileError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// The service answered with a non-zero status code
    #[error("Taste profile service error {code}: {message}")]
    Status { code: i64, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No taste profile API key configured")]
    MissingApiKey,

    /// Cached profile id could not be read or written
    #[error("Settings error: {0}")]
    Store(#[from] krc_common::Error),
}

/// Responses carrying a status block
trait Answer {
    fn status(&self) -> &ResponseStatus;
}

macro_rules! impl_answer {
    ($($ty:ty),*) => {
        $(impl Answer for $ty {
            fn status(&self) -> &ResponseStatus {
                &self.status
            }
        })*
    };
}

impl_answer!(
    StatusOnly,
    ProfileResponse,
    CreateResponse,
    UpdateResponse,
    StatusResponse,
    ReadResponse,
    PlaylistResponse
);

fn check_status<T: Answer>(answer: T) -> Result<T, TasteProfileError> {
    let status = answer.status();
    if status.code == 0 {
        Ok(answer)
    } else {
        Err(TasteProfileError::Status {
            code: status.code,
            message: status.message.clone(),
        })
    }
}

/// Taste profile API client
pub struct TasteProfileClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TasteProfileClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, TasteProfileError> {
        if api_key.trim().is_empty() {
            return Err(TasteProfileError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TasteProfileError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, TasteProfileError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Querying taste profile API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| TasteProfileError::NetworkError(e.to_string()))?;

        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, TasteProfileError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Posting to taste profile API");

        let mut form: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self
            .http_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TasteProfileError::NetworkError(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TasteProfileError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TasteProfileError::ApiError(status.as_u16(), error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| TasteProfileError::NetworkError(e.to_string()))?;
        tracing::trace!(body = %text, "Taste profile response");

        let envelope: Envelope<T> =
            serde_json::from_str(&text).map_err(|e| TasteProfileError::ParseError(e.to_string()))?;
        Ok(envelope.response)
    }

    /// Profile summary by id
    pub async fn profile(&self, profile_id: &str) -> Result<ProfileInfo, TasteProfileError> {
        let answer: ProfileResponse = self
            .get("tasteprofile/profile", &[("id", profile_id.to_string())])
            .await?;
        check_status(answer)?
            .catalog
            .ok_or_else(|| TasteProfileError::ParseError("missing catalog".to_string()))
    }

    /// Profile summary by name, `None` if no profile has that name
    pub async fn profile_by_name(&self, name: &str) -> Result<Option<ProfileInfo>, TasteProfileError> {
        let answer: ProfileResponse = self
            .get("tasteprofile/profile", &[("name", name.to_string())])
            .await?;

        if answer.status.code == STATUS_DOES_NOT_EXIST {
            return Ok(None);
        }
        Ok(check_status(answer)?.catalog)
    }

    /// Create a general profile, returning its id
    pub async fn create(&self, name: &str) -> Result<String, TasteProfileError> {
        let answer: CreateResponse = self
            .post(
                "tasteprofile/create",
                &[("name", name.to_string()), ("type", "general".to_string())],
            )
            .await?;

        let id = check_status(answer)?
            .id
            .ok_or_else(|| TasteProfileError::ParseError("missing profile id".to_string()))?;
        tracing::info!(profile_id = %id, name, "Taste profile created");
        Ok(id)
    }

    pub async fn delete(&self, profile_id: &str) -> Result<(), TasteProfileError> {
        let answer: StatusOnly = self
            .post("tasteprofile/delete", &[("id", profile_id.to_string())])
            .await?;
        check_status(answer)?;
        tracing::info!(profile_id, "Taste profile deleted");
        Ok(())
    }

    /// Push a batch of `update` commands, returning the ticket
    pub async fn update(
        &self,
        profile_id: &str,
        items: &[TasteItem],
    ) -> Result<String, TasteProfileError> {
        let commands: Vec<UpdateCommand<'_>> = items.iter().map(UpdateCommand::update).collect();
        let data = serde_json::to_string(&commands)
            .map_err(|e| TasteProfileError::ParseError(e.to_string()))?;

        let answer: UpdateResponse = self
            .post(
                "tasteprofile/update",
                &[("id", profile_id.to_string()), ("data", data)],
            )
            .await?;

        let ticket = check_status(answer)?
            .ticket
            .ok_or_else(|| TasteProfileError::ParseError("missing ticket".to_string()))?;
        tracing::debug!(profile_id, items = items.len(), ticket = %ticket, "Taste profile update accepted");
        Ok(ticket)
    }

    /// Stored data for one local song
    pub async fn read(
        &self,
        profile_id: &str,
        song_id: ItemId,
    ) -> Result<serde_json::Value, TasteProfileError> {
        let mut params = vec![
            ("id", profile_id.to_string()),
            ("item_id", song_id.to_string()),
        ];
        params.extend(READ_BUCKETS.iter().map(|b| ("bucket", b.to_string())));

        let answer: ReadResponse = self.get("tasteprofile/read", &params).await?;
        check_status(answer)?
            .catalog
            .and_then(|c| c.items.into_iter().next())
            .ok_or_else(|| TasteProfileError::Status {
                code: STATUS_DOES_NOT_EXIST,
                message: format!("song {} not in taste profile", song_id),
            })
    }

    /// Progress of an update ticket
    pub async fn status(&self, ticket: &str) -> Result<TicketStatus, TasteProfileError> {
        let answer: StatusResponse = self
            .get("tasteprofile/status", &[("ticket", ticket.to_string())])
            .await?;
        Ok(check_status(answer)?.ticket)
    }

    pub async fn favorite(&self, profile_id: &str, song_id: ItemId) -> Result<(), TasteProfileError> {
        self.flag("tasteprofile/favorite", profile_id, song_id).await
    }

    pub async fn skip(&self, profile_id: &str, song_id: ItemId) -> Result<(), TasteProfileError> {
        self.flag("tasteprofile/skip", profile_id, song_id).await
    }

    pub async fn ban(&self, profile_id: &str, song_id: ItemId) -> Result<(), TasteProfileError> {
        self.flag("tasteprofile/ban", profile_id, song_id).await
    }

    async fn flag(
        &self,
        path: &str,
        profile_id: &str,
        song_id: ItemId,
    ) -> Result<(), TasteProfileError> {
        let answer: StatusOnly = self
            .get(
                path,
                &[("id", profile_id.to_string()), ("item", song_id.to_string())],
            )
            .await?;
        check_status(answer)?;
        tracing::info!(path, profile_id, song_id, "Taste profile flag set");
        Ok(())
    }

    /// Static playlist seeded by the profile, optionally around one song
    pub async fn static_playlist(
        &self,
        profile_id: &str,
        seed_song: Option<ItemId>,
    ) -> Result<Vec<PlaylistSong>, TasteProfileError> {
        let mut params = vec![
            ("type", "catalog".to_string()),
            ("seed_catalog", profile_id.to_string()),
            ("bucket", format!("id:{}", profile_id)),
        ];
        if let Some(song_id) = seed_song {
            params.push(("song_id", song_foreign_id(profile_id, song_id)));
        }

        let answer: PlaylistResponse = self.get("playlist/static", &params).await?;
        let songs = check_status(answer)?.songs;
        tracing::debug!(profile_id, songs = songs.len(), "Static playlist generated");
        Ok(songs)
    }

    /// Profile id to sync with, creating the profile on first use
    ///
    /// The id is cached in the settings table; a cached id is trusted
    /// without a remote lookup.
    pub async fn ensure_profile(
        &self,
        db: &SqlitePool,
        name: &str,
    ) -> Result<String, TasteProfileError> {
        if let Some(id) = settings::get_taste_profile_id(db).await? {
            tracing::debug!(profile_id = %id, "Using cached taste profile id");
            return Ok(id);
        }

        let id = match self.profile_by_name(name).await? {
            Some(info) => info.id,
            None => {
                tracing::info!(name, "No taste profile found, creating one");
                self.create(name).await?
            }
        };

        settings::set_taste_profile_id(db, id.clone()).await?;
        Ok(id)
    }
}

#[async_trait]
impl TasteProfileService for TasteProfileClient {
    async fn profile(&self, profile_id: &str) -> Result<ProfileInfo, TasteProfileError> {
        TasteProfileClient::profile(self, profile_id).await
    }

    async fn update(
        &self,
        profile_id: &str,
        items: &[TasteItem],
    ) -> Result<String, TasteProfileError> {
        TasteProfileClient::update(self, profile_id, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TasteProfileClient::new("key".to_string(), "http://localhost/api/v4/");
        assert!(client.is_ok());
        assert_eq!(
            client.unwrap().endpoint("tasteprofile/profile"),
            "http://localhost/api/v4/tasteprofile/profile"
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            TasteProfileClient::new("  ".to_string(), "http://localhost"),
            Err(TasteProfileError::MissingApiKey)
        ));
    }

    #[test]
    fn test_check_status() {
        let ok = StatusOnly {
            status: ResponseStatus {
                code: 0,
                message: "Success".to_string(),
            },
        };
        assert!(check_status(ok).is_ok());

        let failed = StatusOnly {
            status: ResponseStatus {
                code: 1,
                message: "Invalid key".to_string(),
            },
        };
        assert!(matches!(
            check_status(failed),
            Err(TasteProfileError::Status { code: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = TasteProfileClient::new("key".to_string(), "http://127.0.0.1:1").unwrap();
        let result = client.profile("CAXYZ").await;
        assert!(matches!(result, Err(TasteProfileError::NetworkError(_))));
    }
}
