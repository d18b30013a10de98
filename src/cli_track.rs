use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use library_track::config::{self, AppConfig, FileConfig, LibrarySettings};
use library_track::{Library, LibraryRegistry, LibraryTrack, TrackId};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Database of a single library, used together with --library-id and --identifier.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    #[clap(long, default_value_t = 1)]
    pub library_id: i32,

    #[clap(long, default_value = "library")]
    pub identifier: String,

    /// Number of read connections per library database.
    #[clap(long)]
    pub read_pool_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the configured libraries.
    Libraries,

    /// Loads a track from its library database and prints its metadata.
    Show {
        library_id: i32,
        track_id: TrackId,
        /// Print as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Adds a track file to a library database.
    AddTrack {
        library_id: i32,
        /// Root directory, with trailing separator.
        root: String,
        /// Folder path relative to the root.
        relative_path: String,
        filename: String,
        #[clap(long, default_value_t = 0)]
        filesize: i64,
        #[clap(long, default_value_t = 0)]
        filetime: i64,
    },
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            read_pool_size: args.read_pool_size,
            library: args.db_path.as_ref().map(|db_path| LibrarySettings {
                id: args.library_id,
                identifier: args.identifier.clone(),
                db_path: db_path.clone(),
            }),
        }
    }
}

#[derive(Serialize)]
struct TrackReport {
    uri: String,
    url: Option<String>,
    found: bool,
    thumbnail_size: Option<usize>,
    values: Vec<(String, String)>,
}

fn show_track(
    registry: Arc<LibraryRegistry>,
    library_id: i32,
    track_id: TrackId,
    json: bool,
) -> Result<()> {
    let library = registry
        .get(library_id)
        .with_context(|| format!("Library {} is not configured", library_id))?;
    let Some(store) = library.store() else {
        bail!("Library {} has no database", library_id);
    };

    let track = LibraryTrack::new(track_id, library_id, registry.clone());
    let found = track.load_file_data(track_id, store)?;
    if found {
        track.load_thumbnail(store)?;
    }

    let report = TrackReport {
        uri: track.uri(),
        url: track.url(),
        found,
        thumbnail_size: track.thumbnail().map(|t| t.len()),
        values: track.get_all_values(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.uri);
    if !report.found {
        println!("  (not found)");
        return Ok(());
    }
    for (name, value) in &report.values {
        println!("  {}: {}", name, value);
    }
    if let Some(size) = report.thumbnail_size {
        println!("  thumbnail: {} bytes", size);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let app_config = AppConfig::resolve(&(&cli_args).into(), file_config)?;
    let registry = Arc::new(LibraryRegistry::from_config(&app_config)?);

    match cli_args.command {
        Command::Libraries => {
            for id in registry.ids() {
                if let Some(library) = registry.get(id) {
                    let db_path = library
                        .store()
                        .map(|s| s.db_path().display().to_string())
                        .unwrap_or_default();
                    println!("{}\t{}\t{}", id, library.identifier(), db_path);
                }
            }
        }
        Command::Show {
            library_id,
            track_id,
            json,
        } => show_track(registry, library_id, track_id, json)?,
        Command::AddTrack {
            library_id,
            root,
            relative_path,
            filename,
            filesize,
            filetime,
        } => {
            let library = registry
                .get(library_id)
                .with_context(|| format!("Library {} is not configured", library_id))?;
            let Some(store) = library.store() else {
                bail!("Library {} has no database", library_id);
            };
            let path_id = store.find_or_add_path(&root)?;
            let folder_name = relative_path
                .rsplit('/')
                .next()
                .unwrap_or(relative_path.as_str())
                .to_string();
            let folder_id = store.find_or_add_folder(path_id, &folder_name, &relative_path)?;
            let track_id = store.add_track(folder_id, &filename, filesize, filetime)?;
            info!("Added track {} to library {}", track_id, library_id);
            println!("{}", LibraryTrack::new(track_id, library_id, registry.clone()).uri());
        }
    }

    Ok(())
}
