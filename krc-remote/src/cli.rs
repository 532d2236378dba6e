//! Command-line interface

use crate::config::ServerOverrides;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for krc-remote
#[derive(Parser, Debug)]
#[command(name = "krc-remote")]
#[command(about = "Kodi remote controller with library sync and taste profile playlists")]
#[command(version)]
pub struct Args {
    /// Folder holding krc.toml and the database
    #[arg(short, long, global = true, env = "KRC_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Kodi host name or address
    #[arg(long, global = true, env = "KRC_HOST")]
    pub host: Option<String>,

    /// Kodi web server port
    #[arg(long, global = true, env = "KRC_PORT")]
    pub port: Option<u16>,

    /// Kodi web server user
    #[arg(long, global = true, env = "KRC_USER")]
    pub user: Option<String>,

    /// Kodi web server password
    #[arg(long, global = true, env = "KRC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn server_overrides(&self) -> ServerOverrides {
        ServerOverrides {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the Kodi server answers
    Ping,

    /// Refresh local snapshots or push to the taste profile
    #[command(subcommand)]
    Sync(SyncCommand),

    /// Query the local song snapshot
    #[command(subcommand)]
    Songs(SongsCommand),

    /// Query the local album snapshot
    #[command(subcommand)]
    Albums(AlbumsCommand),

    /// Control the audio player
    #[command(subcommand)]
    Play(PlayCommand),

    /// Edit the audio playlist
    #[command(subcommand)]
    Playlist(PlaylistCommand),

    /// Set the Kodi volume
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },

    /// Inspect and flag songs in the taste profile
    #[command(subcommand)]
    Taste(TasteCommand),

    /// Manage krc.toml
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    /// Sync songs (delta scan when the snapshot size matches)
    Songs {
        /// Always re-fetch every song
        #[arg(long)]
        full: bool,
    },
    /// Sync albums and the genre index
    Albums,
    /// Push changed ratings and play counts to the taste profile
    Taste,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Text matched against titles and artists
    pub text: String,
}

#[derive(ClapArgs, Debug)]
pub struct RandomArgs {
    /// Number of items to pick
    #[arg(default_value = "10")]
    pub count: usize,

    /// Add the picked items to the playlist
    #[arg(long)]
    pub add: bool,
}

#[derive(Subcommand, Debug)]
pub enum SongsCommand {
    Search(SearchArgs),
    Random(RandomArgs),
    /// Show one stored song
    Info { song_id: u32 },
}

#[derive(Subcommand, Debug)]
pub enum AlbumsCommand {
    Search(SearchArgs),
    Random(RandomArgs),
}

#[derive(Subcommand, Debug)]
pub enum PlayCommand {
    /// Resume, or start the playlist when nothing plays
    Start,
    Stop,
    Next,
    /// Start party mode
    Party,
    /// Show the current song
    What,
}

#[derive(Subcommand, Debug)]
pub enum PlaylistCommand {
    AddSong { song_ids: Vec<u32> },
    AddAlbum { album_ids: Vec<u32> },
    Clear,
    Show,
    /// Replace the playlist with one generated from the taste profile
    Taste,
    /// Like `taste`, seeded by one song
    TasteSeed { song_id: u32 },
}

#[derive(Subcommand, Debug)]
pub enum TasteCommand {
    /// Show the profile summary
    Info,
    /// Delete the remote profile and forget its id
    Delete {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Show what the profile stores for a song
    Read { song_id: u32 },
    /// Show the progress of an update ticket
    Status { ticket: String },
    Favorite { song_id: u32 },
    Skip { song_id: u32 },
    Ban { song_id: u32 },
    /// Store the API key in the database
    SetKey { key: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write krc.toml from the current settings
    Init,
    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_songs_full() {
        let args = Args::try_parse_from(["krc-remote", "sync", "songs", "--full"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Sync(SyncCommand::Songs { full: true })
        ));
    }

    #[test]
    fn test_volume_range_checked() {
        assert!(Args::try_parse_from(["krc-remote", "volume", "50"]).is_ok());
        assert!(Args::try_parse_from(["krc-remote", "volume", "101"]).is_err());
    }

    #[test]
    fn test_global_server_flags() {
        let args = Args::try_parse_from([
            "krc-remote",
            "ping",
            "--host",
            "kodi.lan",
            "--port",
            "9090",
            "-vv",
        ])
        .unwrap();
        let overrides = args.server_overrides();
        assert_eq!(overrides.host.as_deref(), Some("kodi.lan"));
        assert_eq!(overrides.port, Some(9090));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_playlist_add_song_kebab_case() {
        let args =
            Args::try_parse_from(["krc-remote", "playlist", "add-song", "4", "8"]).unwrap();
        match args.command {
            Command::Playlist(PlaylistCommand::AddSong { song_ids }) => {
                assert_eq!(song_ids, vec![4, 8])
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
