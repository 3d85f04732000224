//! SQLite-backed seen filter
//!
//! Keeps the admitted-key set in a single-table database so the at-most-once
//! discovery guarantee survives restarts. Admission is one `INSERT OR IGNORE`;
//! whether the row was actually inserted tells us if the key is new.

use crate::seen::{SeenFilter, SeenResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// Durable seen filter backed by a SQLite database file
pub struct SqliteSeenFilter {
    conn: Connection,
}

impl SqliteSeenFilter {
    /// Opens or creates the seen database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSeenFilter)` - Successfully opened/created database
    /// * `Err(SeenError)` - Failed to open database
    pub fn new(path: &Path) -> SeenResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, useful for tests and dry runs
    pub fn new_in_memory() -> SeenResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS seen_uris (
            key TEXT PRIMARY KEY
        ) WITHOUT ROWID;
    ",
    )
}

impl SeenFilter for SqliteSeenFilter {
    fn admit(&mut self, key: &str) -> SeenResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO seen_uris (key) VALUES (?1)",
            params![key],
        )?;
        Ok(inserted == 1)
    }

    fn count(&self) -> SeenResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_uris", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn close(&mut self) -> SeenResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
