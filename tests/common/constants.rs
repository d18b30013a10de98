//! Shared constants for integration tests

// Each test binary uses a different subset.
#![allow(dead_code)]

/// Id of the test library
pub const LIBRARY_ID: i32 = 7;

/// Identifier of the test library, as it appears in track URIs
pub const LIBRARY_IDENTIFIER: &str = "music";

/// Root directory of the test library
pub const ROOT_PATH: &str = "/music/";

/// Folder of the test tracks, relative to the root
pub const FOLDER_PATH: &str = "rock/first-album";

pub const TRACK_1_FILENAME: &str = "a.mp3";
pub const TRACK_1_SIZE: i64 = 4_194_304;
pub const TRACK_1_TIME: i64 = 1_700_000_000;

pub const TRACK_2_FILENAME: &str = "b.flac";
pub const TRACK_2_SIZE: i64 = 31_457_280;
pub const TRACK_2_TIME: i64 = 1_700_000_600;

/// A track id no test inserts
pub const MISSING_TRACK_ID: i64 = 999;
