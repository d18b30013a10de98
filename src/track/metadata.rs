use crate::library::Library;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ordered multimap of metadata attributes.
///
/// Names are kept sorted, the values of one name keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMap {
    entries: BTreeMap<String, Vec<String>>,
    len: usize,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(name.into())
            .or_default()
            .push(value.into());
        self.len += 1;
    }

    /// First value inserted for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes every value of `name`, returning how many were dropped.
    pub fn remove(&mut self, name: &str) -> usize {
        let removed = self.entries.remove(name).map_or(0, |values| values.len());
        self.len -= removed;
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Default)]
pub(crate) struct MetaState {
    pub metadata: MetadataMap,
    pub thumbnail: Option<Vec<u8>>,
}

/// Lazily created metadata cache of a single track.
///
/// `library` is only held to reach the library-wide track mutex and the
/// library identifier. Without a library the track is detached and only its
/// own mutex is taken.
pub(crate) struct TrackMeta {
    library: Option<Arc<dyn Library>>,
    state: Mutex<MetaState>,
}

impl TrackMeta {
    pub fn new(library: Option<Arc<dyn Library>>) -> Self {
        Self {
            library,
            state: Mutex::new(MetaState::default()),
        }
    }

    pub fn library(&self) -> Option<&Arc<dyn Library>> {
        self.library.as_ref()
    }

    /// Runs `f` on the cached state while holding the library track mutex,
    /// then the track's own mutex. Both are released when `f` returns.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MetaState) -> R) -> R {
        let _library_guard: Option<MutexGuard<'_, ()>> = self
            .library
            .as_ref()
            .map(|library| library.track_mutex().lock().unwrap_or_else(PoisonError::into_inner));
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl fmt::Debug for TrackMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackMeta")
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}
