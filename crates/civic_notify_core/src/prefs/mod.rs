//! Client-local user preferences.
//!
//! # Responsibility
//! - Persist small user toggles (sound on/off) outside of the backend.
//! - Offer a SQLite store for real clients and a memory store for tests.
//!
//! # Invariants
//! - Reads of a missing key return `Ok(None)`, never an error.
//! - Values are stored as the literal strings `true` / `false`.

use crate::db::{open_db, DbError};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

/// Storage key of the sound-enabled toggle.
pub const SOUND_ENABLED_KEY: &str = "notifications.sound_enabled";

#[derive(Debug)]
pub enum PreferenceError {
    Db(DbError),
    /// Stored value could not be parsed as the requested type.
    InvalidValue { key: String, value: String },
    Poisoned,
}

impl Display for PreferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidValue { key, value } => {
                write!(f, "preference `{key}` holds invalid value `{value}`")
            }
            Self::Poisoned => write!(f, "preference store lock poisoned"),
        }
    }
}

impl Error for PreferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for PreferenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PreferenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Boolean key/value preference storage.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError>;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError>;
}

/// SQLite-backed preference store.
pub struct SqlitePreferenceStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    /// Wraps a connection that already went through `open_db`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) the preference file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        Ok(Self::new(open_db(path)?))
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        let conn = self.conn.lock().map_err(|_| PreferenceError::Poisoned)?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match value.as_deref() {
            None => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => {
                warn!("event=preference_read module=prefs status=invalid key={key}");
                Err(PreferenceError::InvalidValue {
                    key: key.to_string(),
                    value: other.to_string(),
                })
            }
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        let conn = self.conn.lock().map_err(|_| PreferenceError::Poisoned)?;
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, if value { "true" } else { "false" }],
        )?;
        Ok(())
    }
}

/// Process-local preference store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        let values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        Ok(values.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
