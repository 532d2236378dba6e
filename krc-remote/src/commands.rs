//! Command dispatch
//!
//! Each command opens what it needs (database, Kodi client, taste profile
//! client), runs one operation and prints plain lines to stdout.

use crate::cli::{
    AlbumsCommand, Args, Command, ConfigCommand, PlayCommand, PlaylistCommand, SongsCommand,
    SyncCommand, TasteCommand,
};
use crate::kodi::KodiClient;
use crate::query::{random_ids, search_albums, search_songs};
use crate::sync::{
    sync_albums, sync_songs, sync_taste_profile, SongSyncOptions, TasteSyncOptions, TokioPacer,
};
use crate::tasteprofile::types::playlist_song_ids;
use crate::tasteprofile::TasteProfileClient;
use anyhow::{bail, Context, Result};
use krc_common::config::{
    load_toml_config, write_toml_config, CompiledDefaults, RootFolderResolver, TomlConfig,
    CONFIG_FILE,
};
use krc_common::db::{self, settings as db_settings, SqliteSnapshotStore, DATABASE_FILE};
use krc_common::models::{Album, GenreIndex, ItemKind, Snapshot, Song, GENRES_KEY};
use krc_common::store::load_snapshot;
use sqlx::SqlitePool;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration resolved before logging starts
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub config_path: PathBuf,
    /// `false` when `krc.toml` was missing and built-in defaults are in use
    pub config_found: bool,
    pub config: TomlConfig,
}

impl Settings {
    /// Resolve the root folder, load `krc.toml` from it and apply CLI overrides
    ///
    /// A `root_folder` set inside the TOML file moves the database, not the
    /// configuration file itself.
    pub fn load(args: &Args) -> Result<Self> {
        let config_root = RootFolderResolver::new()
            .with_cli_arg(args.root_folder.clone())
            .resolve();
        let config_path = config_root.join(CONFIG_FILE);
        let config_found = config_path.exists();

        let mut config = load_toml_config(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        args.server_overrides().apply(&mut config.server);

        let root_folder = RootFolderResolver::new()
            .with_cli_arg(args.root_folder.clone())
            .with_toml_value(config.root_folder.clone())
            .resolve();

        Ok(Self {
            root_folder,
            config_path,
            config_found,
            config,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Run one command
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    match args.command {
        Command::Config(cmd) => config_command(cmd, &settings).await,
        Command::Ping => ping(&settings).await,
        Command::Volume { level } => {
            let kodi = kodi_client(&settings)?;
            kodi.set_volume(level).await.context("Failed to set volume")?;
            println!("Volume set to {}", level);
            Ok(())
        }
        Command::Sync(cmd) => sync_command(cmd, &settings).await,
        Command::Songs(cmd) => songs_command(cmd, &settings).await,
        Command::Albums(cmd) => albums_command(cmd, &settings).await,
        Command::Play(cmd) => play_command(cmd, &settings).await,
        Command::Playlist(cmd) => playlist_command(cmd, &settings).await,
        Command::Taste(cmd) => taste_command(cmd, &settings).await,
    }
}

fn kodi_client(settings: &Settings) -> Result<KodiClient> {
    KodiClient::new(&settings.config.server).context("Failed to create Kodi client")
}

async fn open_database(settings: &Settings) -> Result<SqlitePool> {
    let path = settings.database_path();
    db::init_database(&path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

async fn load_songs(store: &SqliteSnapshotStore) -> Result<Snapshot<Song>> {
    load_snapshot(store, ItemKind::Songs.snapshot_key())
        .await
        .context("Failed to load song snapshot")
}

async fn load_albums(store: &SqliteSnapshotStore) -> Result<Snapshot<Album>> {
    load_snapshot(store, ItemKind::Albums.snapshot_key())
        .await
        .context("Failed to load album snapshot")
}

async fn ping(settings: &Settings) -> Result<()> {
    let kodi = kodi_client(settings)?;
    if !kodi.ping().await {
        bail!("Kodi at {} does not answer", kodi.url());
    }
    let name = match kodi.friendly_name().await {
        Ok(name) => name,
        Err(e) => {
            debug!(error = %e, "Friendly name lookup failed");
            String::new()
        }
    };
    println!("Kodi at {} answers ({})", kodi.url(), name);
    Ok(())
}

async fn sync_command(cmd: SyncCommand, settings: &Settings) -> Result<()> {
    let pool = open_database(settings).await?;
    let store = SqliteSnapshotStore::new(pool.clone());
    let sync_config = &settings.config.sync;

    match cmd {
        SyncCommand::Songs { full } => {
            let kodi = kodi_client(settings)?;
            let mut songs = load_songs(&store).await?;
            let options = SongSyncOptions {
                page_size: sync_config.song_page_size,
                force_full: full,
            };
            let report = sync_songs(&kodi, &store, &mut songs, &options)
                .await
                .context("Song sync failed")?;

            println!(
                "Songs: {} ({} scan, {} pages)",
                songs.len(),
                report.mode,
                report.pages
            );
            if !report.rating_changed.is_empty() {
                println!("Rating changed: {}", join_ids(&report.rating_changed));
            }
            if !report.playcount_changed.is_empty() {
                println!("Play count changed: {}", join_ids(&report.playcount_changed));
            }
        }
        SyncCommand::Albums => {
            let kodi = kodi_client(settings)?;
            let mut albums = load_albums(&store).await?;
            let mut genres: GenreIndex = load_snapshot(&store, GENRES_KEY)
                .await
                .context("Failed to load genre index")?;
            let report = sync_albums(
                &kodi,
                &store,
                &mut albums,
                &mut genres,
                sync_config.album_page_size,
            )
            .await
            .context("Album sync failed")?;

            println!(
                "Albums: {} ({} pages), genres: {} ({} new)",
                albums.len(),
                report.pages,
                genres.len(),
                report.genres_added
            );
        }
        SyncCommand::Taste => {
            let (client, profile_id) = taste_client(settings, &pool).await?;
            let mut songs = load_songs(&store).await?;
            let options = TasteSyncOptions {
                batch_size: sync_config.taste_batch_size,
                pause: Duration::from_millis(sync_config.taste_pause_ms),
            };
            let report = sync_taste_profile(
                &client,
                &store,
                &TokioPacer,
                &profile_id,
                &mut songs,
                &options,
            )
            .await
            .context("Taste profile sync failed")?;

            println!(
                "Pushed {} songs in {} batches ({} sync)",
                report.pushed.len(),
                report.batches,
                report.mode
            );
            for ticket in &report.tickets {
                println!("Ticket: {}", ticket);
            }
        }
    }

    Ok(())
}

async fn songs_command(cmd: SongsCommand, settings: &Settings) -> Result<()> {
    let pool = open_database(settings).await?;
    let store = SqliteSnapshotStore::new(pool);
    let songs = load_songs(&store).await?;

    match cmd {
        SongsCommand::Search(search) => {
            for id in search_songs(&songs, &search.text) {
                print_song_line(id, &songs);
            }
        }
        SongsCommand::Random(random) => {
            let ids = random_ids(&songs, random.count);
            for &id in &ids {
                print_song_line(id, &songs);
            }
            if random.add {
                kodi_client(settings)?
                    .playlist_add_songs(&ids)
                    .await
                    .context("Failed to add songs to the playlist")?;
                println!("Added {} songs to the playlist", ids.len());
            }
        }
        SongsCommand::Info { song_id } => {
            let song = songs
                .get(song_id)
                .with_context(|| format!("Song {} is not in the local snapshot", song_id))?;
            println!("Song id:     {}", song_id);
            println!("Title:       {}", song.title);
            println!("Artist:      {}", song.artist_line());
            println!("Year:        {}", song.year);
            println!("Duration:    {}s", song.duration);
            println!("Genre:       {}", song.genre.join("/"));
            println!("Rating:      {}", song.rating);
            println!("Play count:  {}", song.playcount);
            println!("MusicBrainz: {}", song.musicbrainz_track_id);
            println!(
                "Taste sync:  rating {} / play count {}{}",
                song.synced_rating,
                song.synced_playcount,
                if song.is_taste_pending() { " (pending)" } else { "" }
            );
        }
    }

    Ok(())
}

async fn albums_command(cmd: AlbumsCommand, settings: &Settings) -> Result<()> {
    let pool = open_database(settings).await?;
    let store = SqliteSnapshotStore::new(pool);
    let albums = load_albums(&store).await?;

    let (ids, add) = match cmd {
        AlbumsCommand::Search(search) => (search_albums(&albums, &search.text), false),
        AlbumsCommand::Random(random) => (random_ids(&albums, random.count), random.add),
    };

    for &id in &ids {
        if let Some(album) = albums.get(id) {
            println!("{:>6}  {} - {} ({})", id, album.artist_line(), album.title, album.year);
        }
    }

    if add {
        kodi_client(settings)?
            .playlist_add_albums(&ids)
            .await
            .context("Failed to add albums to the playlist")?;
        println!("Added {} albums to the playlist", ids.len());
    }

    Ok(())
}

async fn play_command(cmd: PlayCommand, settings: &Settings) -> Result<()> {
    let kodi = kodi_client(settings)?;

    match cmd {
        PlayCommand::Start => kodi.playback_start().await?,
        PlayCommand::Stop => kodi.playback_stop().await?,
        PlayCommand::Next => kodi.player_goto_next().await?,
        PlayCommand::Party => kodi.player_open_party().await?,
        PlayCommand::What => {
            if !kodi.player_is_active().await? {
                println!("Nothing is playing");
                return Ok(());
            }
            let item = kodi.player_item().await?;
            let properties = kodi.player_properties().await?;
            println!("{} - {}", item.artist.join("/"), item.label);
            if !item.album.is_empty() {
                println!("Album: {} ({})", item.album, item.year);
            }
            println!(
                "{} / {} ({:.0}%), playlist position {}",
                properties.time, properties.totaltime, properties.percentage, properties.position
            );
        }
    }

    Ok(())
}

async fn playlist_command(cmd: PlaylistCommand, settings: &Settings) -> Result<()> {
    let kodi = kodi_client(settings)?;

    match cmd {
        PlaylistCommand::AddSong { song_ids } => kodi.playlist_add_songs(&song_ids).await?,
        PlaylistCommand::AddAlbum { album_ids } => kodi.playlist_add_albums(&album_ids).await?,
        PlaylistCommand::Clear => kodi.playlist_clear().await?,
        PlaylistCommand::Show => {
            for (position, item) in kodi.playlist_items().await?.iter().enumerate() {
                println!("{:>3}. {} - {}", position, item.artist.join("/"), item.label);
            }
        }
        PlaylistCommand::Taste => taste_playlist(&kodi, settings, None).await?,
        PlaylistCommand::TasteSeed { song_id } => {
            taste_playlist(&kodi, settings, Some(song_id)).await?
        }
    }

    Ok(())
}

/// Replace the playlist with songs picked by the taste profile
async fn taste_playlist(kodi: &KodiClient, settings: &Settings, seed: Option<u32>) -> Result<()> {
    let pool = open_database(settings).await?;
    let (client, profile_id) = taste_client(settings, &pool).await?;

    let songs = client
        .static_playlist(&profile_id, seed)
        .await
        .context("Failed to generate a playlist")?;
    let ids = playlist_song_ids(&songs, &profile_id);
    if ids.is_empty() {
        bail!("The taste profile returned no songs from this library");
    }

    kodi.playlist_clear().await?;
    kodi.playlist_add_songs(&ids).await?;
    info!(songs = ids.len(), "Playlist replaced from taste profile");
    println!("Playlist replaced with {} songs", ids.len());
    Ok(())
}

/// Taste profile client and the id of the profile to use
async fn taste_client(settings: &Settings, pool: &SqlitePool) -> Result<(TasteProfileClient, String)> {
    let api_key = crate::config::resolve_taste_api_key(pool, &settings.config).await?;
    let taste = &settings.config.taste_profile;
    let client = TasteProfileClient::new(api_key, &taste.base_url)?;
    let profile_id = client.ensure_profile(pool, &taste.profile_name).await?;
    Ok((client, profile_id))
}

async fn taste_command(cmd: TasteCommand, settings: &Settings) -> Result<()> {
    let pool = open_database(settings).await?;

    if let TasteCommand::SetKey { key } = &cmd {
        crate::config::store_taste_api_key(&pool, key).await?;
        println!("Taste profile API key stored");
        return Ok(());
    }

    let (client, profile_id) = taste_client(settings, &pool).await?;

    match cmd {
        TasteCommand::Info => {
            let info = client.profile(&profile_id).await?;
            println!("Profile id:      {}", info.id);
            println!("Name:            {}", info.name);
            println!("Type:            {}", info.kind);
            println!("Items:           {}", info.total);
            println!("Resolved:        {}", info.resolved);
            println!("Pending tickets: {}", info.pending_tickets.len());
        }
        TasteCommand::Delete { yes } => {
            if !yes && !confirm(&format!("Delete taste profile {}?", profile_id))? {
                println!("Aborted");
                return Ok(());
            }
            client.delete(&profile_id).await?;
            db_settings::clear_taste_profile_id(&pool).await?;
            println!("Taste profile {} deleted", profile_id);
        }
        TasteCommand::Read { song_id } => {
            let item = client.read(&profile_id, song_id).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        TasteCommand::Status { ticket } => {
            let status = client.status(&ticket).await?;
            println!(
                "{}: {}/{} items ({}%)",
                status.ticket_status, status.items_updated, status.total_items, status.percent_complete
            );
        }
        TasteCommand::Favorite { song_id } => client.favorite(&profile_id, song_id).await?,
        TasteCommand::Skip { song_id } => client.skip(&profile_id, song_id).await?,
        TasteCommand::Ban { song_id } => client.ban(&profile_id, song_id).await?,
        TasteCommand::SetKey { .. } => {}
    }

    Ok(())
}

async fn config_command(cmd: ConfigCommand, settings: &Settings) -> Result<()> {
    match cmd {
        ConfigCommand::Init => {
            write_toml_config(&settings.config, &settings.config_path)
                .with_context(|| format!("Failed to write {}", settings.config_path.display()))?;
            println!("Wrote {}", settings.config_path.display());
        }
        ConfigCommand::Show => {
            println!("# root folder: {}", settings.root_folder.display());
            println!("# config file: {}", settings.config_path.display());
            println!(
                "# default root folder: {}",
                CompiledDefaults::for_current_platform().root_folder.display()
            );
            let mut shown = settings.config.clone();
            if !shown.server.password.is_empty() {
                shown.server.password = "********".to_string();
            }
            print!("{}", toml::to_string_pretty(&shown)?);

            // Only report on an existing database; opening one creates it
            if settings.database_path().exists() {
                let store = SqliteSnapshotStore::new(open_database(settings).await?);
                println!();
                for line in snapshot_status(&store).await? {
                    println!("# {}", line);
                }
            }
        }
    }
    Ok(())
}

/// One line per stored snapshot: item count and last update time
pub async fn snapshot_status(store: &SqliteSnapshotStore) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for key in [
        ItemKind::Songs.snapshot_key(),
        ItemKind::Albums.snapshot_key(),
        GENRES_KEY,
    ] {
        let line = match store.summary(key).await? {
            Some((count, updated_at)) => format!("{}: {} items, updated {}", key, count, updated_at),
            None => format!("{}: never synced", key),
        };
        lines.push(line);
    }
    Ok(lines)
}

fn print_song_line(id: u32, songs: &Snapshot<Song>) {
    if let Some(song) = songs.get(id) {
        println!("{:>6}  {} - {}", id, song.artist_line(), song.title);
    }
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a u32>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
