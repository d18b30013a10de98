use super::metadata::TrackMeta;
use super::{keys, TrackId, URI_SCHEME};
use crate::library::{Library, LibraryId, LibraryResolver, TrackFileStore};
use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Where a track gets its library handle from when its metadata is created.
#[derive(Clone)]
enum LibrarySource {
    Detached,
    Resolver(Arc<dyn LibraryResolver>),
    Handle(Arc<dyn Library>),
}

/// A track stored in a library, addressed by `(library id, track id)`.
///
/// Metadata is cached in memory and only created on first write. Every
/// access to it holds the library-wide track mutex, so tracks of the same
/// library can be shared across threads.
pub struct LibraryTrack {
    id: AtomicI64,
    library_id: LibraryId,
    source: LibrarySource,
    meta: OnceLock<TrackMeta>,
}

impl LibraryTrack {
    /// A track that belongs to no library. Its metadata is protected by the
    /// track's own mutex only.
    pub fn detached(id: TrackId) -> Self {
        Self::from_source(id, 0, LibrarySource::Detached)
    }

    /// A track of library `library_id`, looked up through `resolver` when the
    /// metadata is first needed. A `library_id` of 0 means detached.
    pub fn new(id: TrackId, library_id: LibraryId, resolver: Arc<dyn LibraryResolver>) -> Self {
        let source = if library_id == 0 {
            LibrarySource::Detached
        } else {
            LibrarySource::Resolver(resolver)
        };
        Self::from_source(id, library_id, source)
    }

    pub fn with_library(id: TrackId, library: Arc<dyn Library>) -> Self {
        let library_id = library.id();
        Self::from_source(id, library_id, LibrarySource::Handle(library))
    }

    fn from_source(id: TrackId, library_id: LibraryId, source: LibrarySource) -> Self {
        Self {
            id: AtomicI64::new(id),
            library_id,
            source,
            meta: OnceLock::new(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id.load(Ordering::Acquire)
    }

    pub fn library_id(&self) -> LibraryId {
        self.library_id
    }

    pub fn is_materialized(&self) -> bool {
        self.meta.get().is_some()
    }

    /// The owning library. Resolved on every call until the metadata exists,
    /// after that the handle stored with it is returned.
    pub fn library(&self) -> Option<Arc<dyn Library>> {
        match self.meta.get() {
            Some(meta) => meta.library().cloned(),
            None => self.lookup_library(),
        }
    }

    fn lookup_library(&self) -> Option<Arc<dyn Library>> {
        match &self.source {
            LibrarySource::Detached => None,
            LibrarySource::Resolver(resolver) => {
                let library = resolver.resolve(self.library_id)?;
                if library.id() != self.library_id {
                    warn!(
                        "Resolver returned library {} for id {}, ignoring it",
                        library.id(),
                        self.library_id
                    );
                    return None;
                }
                Some(library)
            }
            LibrarySource::Handle(library) => Some(library.clone()),
        }
    }

    fn init_meta(&self) -> &TrackMeta {
        self.meta.get_or_init(|| {
            let library = self.lookup_library();
            debug!(
                "Materializing metadata of track {} (library {}, resolved={})",
                self.id(),
                self.library_id,
                library.is_some()
            );
            TrackMeta::new(library)
        })
    }

    /// First value stored for `name`. Never creates the metadata cache.
    pub fn get_value(&self, name: &str) -> Option<String> {
        let meta = self.meta.get()?;
        meta.with_state(|state| state.metadata.first(name).map(str::to_owned))
    }

    /// Adds a value for `name`, keeping any existing ones. Empty names or
    /// values are ignored.
    pub fn set_value(&self, name: &str, value: &str) {
        let meta = self.init_meta();
        if name.is_empty() || value.is_empty() {
            return;
        }
        meta.with_state(|state| state.metadata.insert(name, value));
    }

    pub fn clear_value(&self, name: &str) {
        if let Some(meta) = self.meta.get() {
            meta.with_state(|state| state.metadata.remove(name));
        }
    }

    pub fn get_values(&self, name: &str) -> Vec<String> {
        match self.meta.get() {
            Some(meta) => meta.with_state(|state| state.metadata.values(name).to_vec()),
            None => Vec::new(),
        }
    }

    /// Snapshot of every `(name, value)` pair, names in order.
    pub fn get_all_values(&self) -> Vec<(String, String)> {
        match self.meta.get() {
            Some(meta) => meta.with_state(|state| {
                state
                    .metadata
                    .iter()
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect()
            }),
            None => Vec::new(),
        }
    }

    /// Replaces the thumbnail with a copy of `data`. The copy is made before
    /// the lock is taken, the previous blob is freed after it is released.
    pub fn set_thumbnail(&self, data: &[u8]) {
        let meta = self.init_meta();
        let thumbnail = data.to_vec();
        let previous = meta.with_state(|state| state.thumbnail.replace(thumbnail));
        drop(previous);
    }

    pub fn thumbnail(&self) -> Option<Vec<u8>> {
        self.meta
            .get()
            .and_then(|meta| meta.with_state(|state| state.thumbnail.clone()))
    }

    /// `mcdb://<library>/<track id>`, where `<library>` is the library
    /// identifier once the metadata holds a library, the numeric id before.
    pub fn uri(&self) -> String {
        let library = self
            .meta
            .get()
            .and_then(|meta| meta.library())
            .map(|library| library.identifier().to_owned())
            .unwrap_or_else(|| self.library_id.to_string());
        format!("{}://{}/{}", URI_SCHEME, library, self.id())
    }

    pub fn url(&self) -> Option<String> {
        self.get_value(keys::PATH)
    }

    /// Same identity, fresh (empty) metadata.
    pub fn copy(&self) -> LibraryTrack {
        Self::from_source(self.id(), self.library_id, self.source.clone())
    }

    /// Sets the track id to `id` and loads its file attributes from `store`.
    ///
    /// Returns `Ok(false)` when the store has no such track; the id is
    /// updated anyway and no attribute is added.
    pub fn load_file_data(&self, id: TrackId, store: &dyn TrackFileStore) -> Result<bool> {
        self.init_meta();
        self.id.store(id, Ordering::Release);

        let Some(data) = store.track_file_data(id)? else {
            debug!("Track {} not found in library {}", id, self.library_id);
            return Ok(false);
        };
        self.set_value(keys::FILENAME, &data.filename);
        self.set_value(keys::FILESIZE, &data.filesize);
        self.set_value(keys::FILETIME, &data.filetime);
        self.set_value(keys::PATH, &data.path);
        Ok(true)
    }

    /// Loads the stored thumbnail of this track, if it has one.
    pub fn load_thumbnail(&self, store: &dyn TrackFileStore) -> Result<bool> {
        match store.track_thumbnail(self.id())? {
            Some(data) => {
                self.set_thumbnail(&data);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Debug for LibraryTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryTrack")
            .field("id", &self.id())
            .field("library_id", &self.library_id)
            .field("meta", &self.meta.get())
            .finish()
    }
}
