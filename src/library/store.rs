//! SQLite-backed storage of a library's file records.

use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::{TrackFileData, TrackFileStore};
use crate::sqlite_persistence::migrate_if_needed;
use crate::track::TrackId;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const TRACK_FILE_DATA_QUERY: &str = "SELECT t.filename, CAST(t.filesize AS TEXT), CAST(t.filetime AS TEXT), \
     p.path || f.relative_path || '/' || t.filename \
     FROM tracks t, folders f, paths p \
     WHERE t.folder_id = f.id AND f.path_id = p.id AND t.id = ?1";

/// SQLite store for one library: a single write connection plus a small pool
/// of read-only connections handed out round-robin.
#[derive(Clone)]
pub struct SqliteLibraryStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
    db_path: PathBuf,
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SqliteLibraryStore {
    /// Opens (creating if needed) the library database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections, at least 1
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open library database {:?}", db_path))?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", true)?;
        migrate_if_needed(&mut write_conn, LIBRARY_VERSIONED_SCHEMAS)?;

        let track_count: i64 =
            write_conn.query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))?;
        info!("Opened library db {:?}: {} tracks", db_path, track_count);

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteLibraryStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    /// Adds a root directory. `path` should end with a separator, it is
    /// concatenated verbatim with folder paths.
    pub fn add_path(&self, path: &str) -> Result<i64> {
        let conn = lock(&self.write_conn);
        conn.execute("INSERT INTO paths (path) VALUES (?1)", params![path])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_folder(&self, path_id: i64, name: &str, relative_path: &str) -> Result<i64> {
        let conn = lock(&self.write_conn);
        conn.execute(
            "INSERT INTO folders (name, relative_path, path_id) VALUES (?1, ?2, ?3)",
            params![name, relative_path, path_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Id of the root `path`, inserting it if it is not known yet.
    pub fn find_or_add_path(&self, path: &str) -> Result<i64> {
        let conn = lock(&self.write_conn);
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM paths WHERE path = ?1", params![path], |r| {
                r.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        conn.execute("INSERT INTO paths (path) VALUES (?1)", params![path])?;
        Ok(conn.last_insert_rowid())
    }

    /// Id of the folder at `relative_path` below root `path_id`, inserting it
    /// if it is not known yet.
    pub fn find_or_add_folder(&self, path_id: i64, name: &str, relative_path: &str) -> Result<i64> {
        let conn = lock(&self.write_conn);
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM folders WHERE path_id = ?1 AND relative_path = ?2",
                params![path_id, relative_path],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        conn.execute(
            "INSERT INTO folders (name, relative_path, path_id) VALUES (?1, ?2, ?3)",
            params![name, relative_path, path_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_track(
        &self,
        folder_id: i64,
        filename: &str,
        filesize: i64,
        filetime: i64,
    ) -> Result<TrackId> {
        let conn = lock(&self.write_conn);
        conn.execute(
            "INSERT INTO tracks (filename, filesize, filetime, folder_id) VALUES (?1, ?2, ?3, ?4)",
            params![filename, filesize, filetime, folder_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Stores (or clears, with `None`) the thumbnail blob of a track.
    pub fn set_track_thumbnail(&self, track_id: TrackId, data: Option<&[u8]>) -> Result<bool> {
        let conn = lock(&self.write_conn);
        let updated = conn.execute(
            "UPDATE tracks SET thumbnail = ?1 WHERE id = ?2",
            params![data, track_id],
        )?;
        Ok(updated > 0)
    }

    pub fn track_count(&self) -> Result<usize> {
        let conn = self.get_read_conn();
        let conn = lock(&conn);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

impl TrackFileStore for SqliteLibraryStore {
    fn track_file_data(&self, track_id: TrackId) -> Result<Option<TrackFileData>> {
        let conn = self.get_read_conn();
        let conn = lock(&conn);
        let mut stmt = conn.prepare_cached(TRACK_FILE_DATA_QUERY)?;
        let data = stmt
            .query_row(params![track_id], |row| {
                Ok(TrackFileData {
                    filename: row.get(0)?,
                    filesize: row.get(1)?,
                    filetime: row.get(2)?,
                    path: row.get(3)?,
                })
            })
            .optional()?;
        debug!("track_file_data({}) found={}", track_id, data.is_some());
        Ok(data)
    }

    fn track_thumbnail(&self, track_id: TrackId) -> Result<Option<Vec<u8>>> {
        let conn = self.get_read_conn();
        let conn = lock(&conn);
        let thumbnail: Option<Option<Vec<u8>>> = conn
            .query_row(
                "SELECT thumbnail FROM tracks WHERE id = ?1",
                params![track_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(thumbnail.flatten())
    }
}
