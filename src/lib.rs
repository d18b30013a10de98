//! Library Track
//!
//! Lazily loaded, thread-safe metadata records for tracks stored in a
//! library database.

pub mod config;
pub mod library;
pub mod sqlite_persistence;
pub mod track;

pub use library::{
    Library, LibraryId, LibraryRegistry, LibraryResolver, LocalLibrary, SqliteLibraryStore,
    TrackFileData, TrackFileStore,
};
pub use track::{LibraryTrack, MetadataMap, TrackId};
