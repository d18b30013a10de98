//! Libraries: the collections tracks belong to.
//!
//! A track never reaches a library through global state. It is handed either
//! the library itself or a [`LibraryResolver`] able to look it up by id.

mod registry;
mod schema;
mod store;

pub use registry::{LibraryRegistry, RegistryError};
pub use schema::LIBRARY_VERSIONED_SCHEMAS;
pub use store::SqliteLibraryStore;

use crate::track::TrackId;
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

pub type LibraryId = i32;

/// What a track needs from its library: identity and the mutex shared by
/// every track of the library.
pub trait Library: Send + Sync {
    fn id(&self) -> LibraryId;

    /// Stable, human readable identifier used in track URIs.
    fn identifier(&self) -> &str;

    /// Mutex guarding the cached metadata of all tracks of this library.
    fn track_mutex(&self) -> &Mutex<()>;
}

impl fmt::Debug for dyn Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("id", &self.id())
            .field("identifier", &self.identifier())
            .finish()
    }
}

/// Maps a library id to its live handle. Implementations must hand out the
/// same instance for the same id, otherwise tracks would not share a mutex.
pub trait LibraryResolver: Send + Sync {
    fn resolve(&self, id: LibraryId) -> Option<Arc<dyn Library>>;
}

/// File attributes of a track as stored in the library database, already
/// converted to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackFileData {
    pub filename: String,
    pub filesize: String,
    pub filetime: String,
    pub path: String,
}

/// Read access to the file records of a library.
pub trait TrackFileStore: Send + Sync {
    /// Looks up filename, size, modification time and full path of a track.
    /// A missing track is `Ok(None)`, not an error.
    fn track_file_data(&self, track_id: TrackId) -> Result<Option<TrackFileData>>;

    fn track_thumbnail(&self, track_id: TrackId) -> Result<Option<Vec<u8>>>;
}

/// A library living in this process, optionally backed by its own database.
pub struct LocalLibrary {
    id: LibraryId,
    identifier: String,
    track_mutex: Mutex<()>,
    store: Option<SqliteLibraryStore>,
}

impl LocalLibrary {
    pub fn new(id: LibraryId, identifier: impl Into<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            track_mutex: Mutex::new(()),
            store: None,
        }
    }

    pub fn with_store(
        id: LibraryId,
        identifier: impl Into<String>,
        store: SqliteLibraryStore,
    ) -> Self {
        Self {
            store: Some(store),
            ..Self::new(id, identifier)
        }
    }

    pub fn store(&self) -> Option<&SqliteLibraryStore> {
        self.store.as_ref()
    }
}

impl Library for LocalLibrary {
    fn id(&self) -> LibraryId {
        self.id
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn track_mutex(&self) -> &Mutex<()> {
        &self.track_mutex
    }
}
