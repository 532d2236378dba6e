//! Configuration resolution for krc-remote
//!
//! Server settings come from command line flags (which clap also reads
//! from `KRC_HOST`, `KRC_PORT`, `KRC_USER`, `KRC_PASSWORD`) over the TOML
//! file. The taste profile API key is resolved Database → ENV → TOML.

use krc_common::config::{ServerConfig, TomlConfig};
use krc_common::db::settings;
use krc_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the taste profile API key
pub const TASTE_API_KEY_ENV: &str = "KRC_TASTE_API_KEY";

/// Server settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ServerOverrides {
    /// Overlay the given values on `server`
    pub fn apply(&self, server: &mut ServerConfig) {
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(user) = &self.user {
            server.user = user.clone();
        }
        if let Some(password) = &self.password {
            server.password = password.clone();
        }
    }
}

/// Resolve the taste profile API key
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_taste_api_key(db: &Pool<Sqlite>, toml_config: &TomlConfig) -> Result<String> {
    let db_key = settings::get_taste_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(TASTE_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .taste_profile
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        ("database", db_key.is_some()),
        ("environment", env_key.is_some()),
        ("TOML", toml_key.is_some()),
    ]
    .iter()
    .filter(|(_, found)| *found)
    .map(|(name, _)| *name)
    .collect();

    if sources.len() > 1 {
        warn!(
            "Taste profile API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("Taste profile API key loaded from database");
        return Ok(key);
    }

    if let Some(key) = env_key {
        info!("Taste profile API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Taste profile API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Taste profile API key not configured. Set it with one of:\n\
         1. krc-remote taste set-key <key>\n\
         2. Environment: {}=<key>\n\
         3. TOML config: [taste_profile] api_key = \"<key>\"",
        TASTE_API_KEY_ENV
    )))
}

/// Store the taste profile API key in the database
///
/// The key is trimmed; a blank key is rejected.
pub async fn store_taste_api_key(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    if !is_valid_key(key) {
        return Err(Error::InvalidInput(
            "taste profile API key must not be empty".to_string(),
        ));
    }
    settings::set_taste_api_key(db, key.trim().to_string()).await
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default log filter when `RUST_LOG` is not set
///
/// Each `-v` raises verbosity one step above the configured level.
pub fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_only_given_fields() {
        let mut server = ServerConfig::default();
        let overrides = ServerOverrides {
            host: Some("kodi.lan".to_string()),
            port: Some(9090),
            ..Default::default()
        };

        overrides.apply(&mut server);

        assert_eq!(server.host, "kodi.lan");
        assert_eq!(server.port, 9090);
        assert_eq!(server.user, "kodi");
        assert_eq!(server.jsonrpc_url(), "http://kodi.lan:9090/jsonrpc");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, "warn"), "warn");
        assert_eq!(log_filter(1, "warn"), "info");
        assert_eq!(log_filter(3, "warn"), "debug");
    }
}
