//! krc-remote library interface
//!
//! Kodi JSON-RPC client, taste profile client, and the sync engine that
//! mirrors the Kodi audio library into local snapshots.

pub mod cli;
pub mod commands;
pub mod config;
pub mod kodi;
pub mod query;
pub mod sync;
pub mod tasteprofile;

pub use crate::kodi::{KodiClient, KodiError};
pub use crate::sync::{LibraryService, SyncError, TasteProfileService};
pub use crate::tasteprofile::{TasteProfileClient, TasteProfileError};
