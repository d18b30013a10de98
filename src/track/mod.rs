mod library_track;
mod metadata;

pub use library_track::LibraryTrack;
pub use metadata::MetadataMap;

pub type TrackId = i64;

/// Scheme of track URIs, see [`LibraryTrack::uri`].
pub const URI_SCHEME: &str = "mcdb";

/// Attribute names filled in from the library database.
pub mod keys {
    pub const FILENAME: &str = "filename";
    pub const FILESIZE: &str = "filesize";
    pub const FILETIME: &str = "filetime";
    pub const PATH: &str = "path";
}
