//! Configuration loading and root folder resolution
//!
//! The TOML file only carries bootstrap settings: where the Kodi server
//! lives, taste profile credentials, sync tuning and logging. A missing
//! file is never fatal; every field has a built-in default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "KRC_ROOT_FOLDER";

/// Configuration file name inside the root folder
pub const CONFIG_FILE: &str = "krc.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional, see [`RootFolderResolver`])
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub taste_profile: TasteProfileConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Kodi JSON-RPC endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
        }
    }
}

impl ServerConfig {
    /// JSON-RPC endpoint URL
    pub fn jsonrpc_url(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host, self.port)
    }
}

/// Taste profile web API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteProfileConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the profile created for this library
    #[serde(default = "default_profile_name")]
    pub profile_name: String,

    #[serde(default = "default_taste_base_url")]
    pub base_url: String,
}

impl Default for TasteProfileConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            profile_name: default_profile_name(),
            base_url: default_taste_base_url(),
        }
    }
}

/// Page and batch sizes used by the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_page_size")]
    pub song_page_size: usize,

    #[serde(default = "default_page_size")]
    pub album_page_size: usize,

    #[serde(default = "default_taste_batch_size")]
    pub taste_batch_size: usize,

    /// Pause between taste profile batches (max 120 calls per minute)
    #[serde(default = "default_taste_pause_ms")]
    pub taste_pause_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            song_page_size: default_page_size(),
            album_page_size: default_page_size(),
            taste_batch_size: default_taste_batch_size(),
            taste_pause_ms: default_taste_pause_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_user() -> String {
    "kodi".to_string()
}

fn default_profile_name() -> String {
    "krc library".to_string()
}

fn default_taste_base_url() -> String {
    "http://developer.echonest.com/api/v4".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_taste_batch_size() -> usize {
    25
}

fn default_taste_pause_ms() -> u64 {
    510
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl TomlConfig {
    /// Reject settings the sync engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sync.song_page_size == 0 || self.sync.album_page_size == 0 {
            return Err(Error::Config("page sizes must be at least 1".to_string()));
        }
        if self.sync.taste_batch_size == 0 {
            return Err(Error::Config("taste_batch_size must be at least 1".to_string()));
        }
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server host is empty".to_string()));
        }
        Ok(())
    }
}

/// Load the TOML configuration, falling back to defaults when the file is missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write the configuration atomically (temp file, then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Built-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: get_default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default root folder
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("krc"))
        .unwrap_or_else(|| PathBuf::from("./krc_data"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `KRC_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML file
/// 4. OS-dependent compiled default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        get_default_root_folder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sync.song_page_size, 20);
        assert_eq!(config.sync.taste_batch_size, 25);
        assert_eq!(config.sync.taste_pause_ms, 510);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [server]
            host = "192.168.1.20"

            [sync]
            song_page_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "192.168.1.20");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sync.song_page_size, 50);
        assert_eq!(config.sync.album_page_size, 20);
        assert_eq!(config.server.jsonrpc_url(), "http://192.168.1.20:8080/jsonrpc");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = TomlConfig::default();
        config.sync.taste_batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
