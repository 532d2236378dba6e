//! Configuration loading and root folder resolution tests
//!
//! Tests touching KRC_ROOT_FOLDER are marked #[serial] so they never race
//! on the process environment.

use krc_common::config::{
    load_toml_config, write_toml_config, CompiledDefaults, RootFolderResolver, TomlConfig,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();

    assert!(!root_folder.as_os_str().is_empty());
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/krc-env");

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/krc-cli")))
        .with_toml_value(Some(PathBuf::from("/tmp/krc-toml")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/krc-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/krc-env");

    let root_folder = RootFolderResolver::new()
        .with_toml_value(Some(PathBuf::from("/tmp/krc-toml")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/krc-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_value_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new()
        .with_toml_value(Some(PathBuf::from("/srv/krc")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/srv/krc"));
}

#[test]
fn test_missing_config_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_write_then_load_preserves_fields() {
    let temp_dir = TempDir::new().unwrap();
    let toml_path = temp_dir.path().join("nested").join("krc.toml");

    let mut config = TomlConfig::default();
    config.root_folder = Some(PathBuf::from("/music"));
    config.server.host = "htpc.local".to_string();
    config.server.password = "secret".to_string();
    config.taste_profile.api_key = Some("KEY123".to_string());
    config.sync.taste_pause_ms = 1000;

    write_toml_config(&config, &toml_path).unwrap();
    assert!(!toml_path.with_extension("toml.tmp").exists());

    let loaded = load_toml_config(&toml_path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let toml_path = temp_dir.path().join("krc.toml");
    std::fs::write(&toml_path, "[server\nhost = ").unwrap();

    let result = load_toml_config(&toml_path);
    assert!(matches!(result, Err(krc_common::Error::Config(_))));
}

#[test]
fn test_zero_page_size_rejected_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let toml_path = temp_dir.path().join("krc.toml");
    std::fs::write(&toml_path, "[sync]\nsong_page_size = 0\n").unwrap();

    assert!(load_toml_config(&toml_path).is_err());
}
