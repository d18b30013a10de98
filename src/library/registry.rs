use super::{Library, LibraryId, LibraryResolver, LocalLibrary, SqliteLibraryStore};
use crate::config::AppConfig;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Library {0} is already registered")]
    DuplicateLibrary(LibraryId),

    #[error("Library id 0 is reserved for detached tracks")]
    ReservedId,

    #[error("Failed to open library {id}: {source}")]
    Store {
        id: LibraryId,
        #[source]
        source: anyhow::Error,
    },
}

/// Owns the live libraries of the process, keyed by id.
#[derive(Default)]
pub struct LibraryRegistry {
    libraries: RwLock<HashMap<LibraryId, Arc<LocalLibrary>>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens every library listed in the configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for settings in &config.libraries {
            let store = SqliteLibraryStore::new(&settings.db_path, config.read_pool_size)
                .map_err(|source| RegistryError::Store {
                    id: settings.id,
                    source,
                })?;
            registry.register(LocalLibrary::with_store(
                settings.id,
                settings.identifier.clone(),
                store,
            ))?;
        }
        Ok(registry)
    }

    pub fn register(&self, library: LocalLibrary) -> Result<Arc<LocalLibrary>, RegistryError> {
        let id = library.id();
        if id == 0 {
            return Err(RegistryError::ReservedId);
        }

        let mut libraries = self
            .libraries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if libraries.contains_key(&id) {
            return Err(RegistryError::DuplicateLibrary(id));
        }
        let library = Arc::new(library);
        libraries.insert(id, library.clone());
        info!("Registered library {} ({})", id, library.identifier());
        Ok(library)
    }

    pub fn get(&self, id: LibraryId) -> Option<Arc<LocalLibrary>> {
        self.libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Registered ids, ascending.
    pub fn ids(&self) -> Vec<LibraryId> {
        let mut ids: Vec<_> = self
            .libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl LibraryResolver for LibraryRegistry {
    fn resolve(&self, id: LibraryId) -> Option<Arc<dyn Library>> {
        let library = self.get(id);
        if library.is_none() {
            warn!("Library {} is not registered", id);
        }
        library.map(|l| l as Arc<dyn Library>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibrarySettings;
    use tempfile::tempdir;

    #[test]
    fn resolve_returns_same_instance() {
        let registry = LibraryRegistry::new();
        registry.register(LocalLibrary::new(3, "music")).unwrap();

        let a = registry.resolve(3).unwrap();
        let b = registry.resolve(3).unwrap();
        assert!(std::ptr::eq(a.track_mutex(), b.track_mutex()));
        assert_eq!(a.identifier(), "music");
    }

    #[test]
    fn resolve_unknown_library() {
        let registry = LibraryRegistry::new();
        assert!(registry.resolve(42).is_none());
    }

    #[test]
    fn register_rejects_duplicates_and_zero() {
        let registry = LibraryRegistry::new();
        registry.register(LocalLibrary::new(1, "a")).unwrap();

        assert!(matches!(
            registry.register(LocalLibrary::new(1, "b")),
            Err(RegistryError::DuplicateLibrary(1))
        ));
        assert!(matches!(
            registry.register(LocalLibrary::new(0, "c")),
            Err(RegistryError::ReservedId)
        ));
        assert_eq!(registry.get(1).unwrap().identifier(), "a");
    }

    #[test]
    fn from_config_opens_stores() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            read_pool_size: 1,
            libraries: vec![
                LibrarySettings {
                    id: 2,
                    identifier: "podcasts".to_string(),
                    db_path: dir.path().join("podcasts.db"),
                },
                LibrarySettings {
                    id: 1,
                    identifier: "music".to_string(),
                    db_path: dir.path().join("music.db"),
                },
            ],
        };

        let registry = LibraryRegistry::from_config(&config).unwrap();

        assert_eq!(registry.ids(), vec![1, 2]);
        let music = registry.get(1).unwrap();
        assert_eq!(music.store().unwrap().track_count().unwrap(), 0);
    }
}
