//! krc-remote - Kodi remote controller
//!
//! One-shot command line client: every invocation loads the configuration,
//! runs a single command against Kodi, the local snapshots or the taste
//! profile service, and exits.

use anyhow::{Context, Result};
use clap::Parser;
use krc_common::config::LoggingConfig;
use krc_remote::cli::Args;
use krc_remote::commands::{self, Settings};
use krc_remote::config::log_filter;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args)?;

    init_tracing(args.verbose, &settings.config.logging)?;

    info!(
        "Starting krc-remote v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Config is loaded before the subscriber exists
    if !settings.config_found {
        warn!(
            "Config file {} not found, using built-in defaults",
            settings.config_path.display()
        );
    }
    debug!(
        root_folder = %settings.root_folder.display(),
        config = %settings.config_path.display(),
        kodi = %settings.config.server.jsonrpc_url(),
        "Configuration resolved"
    );

    commands::run(args, settings).await
}

/// `RUST_LOG` wins; otherwise `-v` flags, then the configured level
fn init_tracing(verbose: u8, logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose, &logging.level)));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
