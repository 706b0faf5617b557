//! SQLite-backed key-value store and event history.
//!
//! The timer is stored one field per key, under the same names the browser
//! build used, so a store written by an older build loads field by field with
//! defaults for anything missing.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::timer::{Mode, StateStore, TimerState, DEFAULT_FOCUS_SECS, DEFAULT_REST_SECS};

pub const KEY_MODE: &str = "mode";
pub const KEY_REMAINING: &str = "remainingSeconds";
pub const KEY_RUNNING: &str = "running";
pub const KEY_ANCHOR: &str = "anchorTimestamp";
pub const KEY_FOCUS_DURATION: &str = "focusDurationSeconds";
pub const KEY_REST_DURATION: &str = "restDurationSeconds";
pub const KEY_REST_SURPLUS: &str = "restSurplusSeconds";
/// Epoch milliseconds of the pending wake-up, if any.
pub const KEY_WAKE_AT: &str = "wakeAt";

const STATE_KEYS: [&str; 7] = [
    KEY_MODE,
    KEY_REMAINING,
    KEY_RUNNING,
    KEY_ANCHOR,
    KEY_FOCUS_DURATION,
    KEY_REST_DURATION,
    KEY_REST_SURPLUS,
];

/// SQLite database holding the timer and its history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/pomobank.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("pomobank.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Key-value ────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Wake deadline ────────────────────────────────────────────────

    pub fn wake_deadline(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.kv_get(KEY_WAKE_AT)? else {
            return Ok(None);
        };
        match raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis) {
            Some(at) => Ok(Some(at)),
            None => {
                warn!(value = %raw, "discarding unreadable wake deadline");
                self.kv_delete(KEY_WAKE_AT)?;
                Ok(None)
            }
        }
    }

    pub fn set_wake_deadline(&self, at: DateTime<Utc>) -> Result<()> {
        self.kv_set(KEY_WAKE_AT, &at.timestamp_millis().to_string())
    }

    pub fn clear_wake_deadline(&self) -> Result<()> {
        self.kv_delete(KEY_WAKE_AT)
    }

    // ── Event history ────────────────────────────────────────────────

    pub fn record_event(&self, event: &Event) -> Result<i64> {
        let payload = serde_json::to_string(event)?;
        self.conn.execute(
            "INSERT INTO events (kind, at, payload) VALUES (?1, ?2, ?3)",
            params![event.kind(), event.at().to_rfc3339(), payload],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent `limit` events, oldest first.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM (
                SELECT id, payload FROM events ORDER BY id DESC LIMIT ?1
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut events = Vec::new();
        for row in rows {
            let payload = row?;
            match serde_json::from_str::<Event>(&payload) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "skipping unreadable history entry"),
            }
        }
        Ok(events)
    }

    // ── Timer fields ─────────────────────────────────────────────────

    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.kv_get(key)?.and_then(|raw| match raw.trim().parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(key, value = %raw, "ignoring unreadable timer field");
                None
            }
        }))
    }

    fn get_duration(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_i64(key)? {
            Some(v) if v > 0 => Ok(v),
            Some(v) => {
                warn!(key, value = v, default, "stored duration not positive, using default");
                Ok(default)
            }
            None => Ok(default),
        }
    }
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<TimerState>> {
        let mut present = false;
        for key in STATE_KEYS {
            if self.kv_get(key)?.is_some() {
                present = true;
                break;
            }
        }
        if !present {
            return Ok(None);
        }

        let focus = self.get_duration(KEY_FOCUS_DURATION, DEFAULT_FOCUS_SECS)?;
        let rest = self.get_duration(KEY_REST_DURATION, DEFAULT_REST_SECS)?;
        let mut state = TimerState::new(focus, rest)?;

        state.mode = match self.kv_get(KEY_MODE)? {
            Some(raw) => raw.parse::<Mode>().unwrap_or_else(|e| {
                warn!(error = %e, "unreadable mode, using focus");
                Mode::Focus
            }),
            None => Mode::Focus,
        };
        state.remaining_seconds = self
            .get_i64(KEY_REMAINING)?
            .unwrap_or_else(|| state.duration_of(state.mode));
        state.running = match self.kv_get(KEY_RUNNING)? {
            Some(raw) => raw.trim().parse::<bool>().unwrap_or_else(|_| {
                warn!(value = %raw, "unreadable running flag, treating as paused");
                false
            }),
            None => false,
        };
        state.anchor_timestamp = self.get_i64(KEY_ANCHOR)?.unwrap_or(0);
        state.rest_surplus_seconds = self.get_i64(KEY_REST_SURPLUS)?.unwrap_or(0);
        Ok(Some(state))
    }

    fn save(&self, state: &TimerState) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let fields = [
            (KEY_MODE, state.mode.as_str().to_string()),
            (KEY_REMAINING, state.remaining_seconds.to_string()),
            (KEY_RUNNING, state.running.to_string()),
            (KEY_ANCHOR, state.anchor_timestamp.to_string()),
            (KEY_FOCUS_DURATION, state.focus_duration_seconds().to_string()),
            (KEY_REST_DURATION, state.rest_duration_seconds().to_string()),
            (KEY_REST_SURPLUS, state.rest_surplus_seconds.to_string()),
        ];
        for (key, value) in &fields {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
