//! SQLite schema of a library database.
//!
//! A track's full path is assembled from three tables: the root `paths` a
//! library scans, the `folders` below each root (stored relative to it) and
//! the `tracks` inside each folder.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

/// Root directories of the library. `path` keeps its trailing separator.
const PATHS_TABLE: Table = Table {
    name: "paths",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("path", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_paths_path", "path")],
};

const FOLDERS_TABLE: Table = Table {
    name: "folders",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("relative_path", &SqlType::Text, non_null = true),
        sqlite_column!(
            "path_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "paths",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
    ],
    indices: &[("idx_folders_path_id", "path_id")],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("filename", &SqlType::Text, non_null = true),
        sqlite_column!("filesize", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("filetime", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!(
            "folder_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "folders",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("thumbnail", &SqlType::Blob),
    ],
    indices: &[("idx_tracks_folder_id", "folder_id")],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[PATHS_TABLE, FOLDERS_TABLE, TRACKS_TABLE],
    migration: None,
}];
