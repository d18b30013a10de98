mod file_config;

pub use file_config::{FileConfig, LibraryFileConfig};

use crate::library::LibraryId;
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_READ_POOL_SIZE: usize = 2;

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub read_pool_size: Option<usize>,
    /// A single library given on the command line.
    pub library: Option<LibrarySettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySettings {
    pub id: LibraryId,
    pub identifier: String,
    pub db_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub read_pool_size: usize,
    pub libraries: Vec<LibrarySettings>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values; libraries from both sources are merged,
    /// the file wins when both declare the same id.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let read_pool_size = file
            .read_pool_size
            .or(cli.read_pool_size)
            .unwrap_or(DEFAULT_READ_POOL_SIZE);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        let mut libraries: Vec<LibrarySettings> = file
            .libraries
            .into_iter()
            .map(|l| LibrarySettings {
                id: l.id,
                identifier: l.identifier,
                db_path: PathBuf::from(l.db_path),
            })
            .collect();
        if let Some(cli_library) = &cli.library {
            if !libraries.iter().any(|l| l.id == cli_library.id) {
                libraries.push(cli_library.clone());
            }
        }

        let mut seen = HashSet::new();
        for library in &libraries {
            if library.id == 0 {
                bail!("Library '{}' uses reserved id 0", library.identifier);
            }
            if library.identifier.is_empty() {
                bail!("Library {} has an empty identifier", library.id);
            }
            if !seen.insert(library.id) {
                bail!("Library id {} is declared more than once", library.id);
            }
        }

        Ok(Self {
            read_pool_size,
            libraries,
        })
    }
}
