//! Test fixture creation for library databases

use super::constants::*;
use anyhow::Result;
use library_track::{LibraryRegistry, LocalLibrary, SqliteLibraryStore, TrackId};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestLibrary {
    // Keeps the database directory alive for the duration of the test
    _dir: TempDir,
    pub registry: Arc<LibraryRegistry>,
    pub library: Arc<LocalLibrary>,
    pub track_1: TrackId,
    pub track_2: TrackId,
}

impl TestLibrary {
    pub fn store(&self) -> &SqliteLibraryStore {
        self.library.store().expect("test library has a store")
    }
}

/// Creates a registry with one library holding two tracks in one folder.
pub fn create_test_library() -> Result<TestLibrary> {
    let dir = TempDir::new()?;
    let store = SqliteLibraryStore::new(dir.path().join("library.db"), 2)?;

    let path_id = store.add_path(ROOT_PATH)?;
    let folder_id = store.add_folder(path_id, "first-album", FOLDER_PATH)?;
    let track_1 = store.add_track(folder_id, TRACK_1_FILENAME, TRACK_1_SIZE, TRACK_1_TIME)?;
    let track_2 = store.add_track(folder_id, TRACK_2_FILENAME, TRACK_2_SIZE, TRACK_2_TIME)?;

    let registry = Arc::new(LibraryRegistry::new());
    let library = registry.register(LocalLibrary::with_store(
        LIBRARY_ID,
        LIBRARY_IDENTIFIER,
        store,
    ))?;

    Ok(TestLibrary {
        _dir: dir,
        registry,
        library,
        track_1,
        track_2,
    })
}
