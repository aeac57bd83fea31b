//! SQLite persistence layer.
//!
//! RULE: Only store.rs and its submodules talk to the database.
//! Components call store methods; they never execute SQL directly.

mod complaint;
mod staff;

use crate::{error::CoreResult, event::EventLogEntry};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};

pub struct Store {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl Store {
    /// Open (or create) the tracker database at `path`.
    pub fn open(path: &str) -> CoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Open a new, independent connection to the same database.
    ///
    /// The background scheduler thread uses this so it never shares a
    /// connection with request-path writers. For in-memory databases the
    /// result is an isolated database, so schedule only against files.
    pub fn reopen(&self) -> CoreResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_complaints.sql"))?;
        Ok(())
    }

    /// Runs one raw SQL statement against the open connection.
    ///
    /// Escape hatch for tests that need rows the typed API refuses to
    /// write (e.g. corrupt directory entries for failure-path checks).
    #[doc(hidden)]
    pub fn execute_raw(&self, sql: &str) -> CoreResult<usize> {
        let changed = self.conn.execute(sql, [])?;
        Ok(changed)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (occurred_at, event_type, payload)
             VALUES (?1, ?2, ?3)",
            params![entry.occurred_at.timestamp(), entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_by_type(&self, event_type: &str) -> CoreResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, occurred_at, event_type, payload
             FROM event_log WHERE event_type = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![event_type], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    occurred_at: from_unix(row.get(1)?),
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self) -> CoreResult<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM event_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ── Column conversion helpers ──────────────────────────────────

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

pub(crate) fn to_unix(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Maps a stored enum string onto its closed type inside a row mapper.
pub(crate) fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
