use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::place::{Anchor, Place, TimeBudget};

const STATE_SCHEMA: &str = include_str!("../../sql/state.sql");

/// Storage key for the current persisted-state layout. Bump the suffix
/// when the blob shape changes; older blobs then fail to load and the
/// session starts empty, which is the documented recovery path.
pub const STATE_KEY: &str = "waypoint.session.v1";

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type PersistResult<T> = std::result::Result<T, PersistError>;

/// Full session state as one durable blob. Load is full-replace: the blob
/// overwrites in-memory state, never merges with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub places: Vec<Place>,
    pub anchor: Option<Anchor>,
    pub time_budget: TimeBudget,
    pub saved_at: DateTime<Utc>,
}

/// Key-value contract the durable storage collaborator exposes.
pub trait StateStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PersistResult<()>;
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        (**self).set(key, value)
    }
}

/// JSON file store with atomic replace semantics: writes go to a sibling
/// temp file first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_map(&self) -> PersistResult<serde_json::Map<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let map = self.read_map()?;
        Ok(map
            .get(key)
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(err) => {
                warn!(target: "persist", error = %err, "state file unreadable, rewriting");
                serde_json::Map::new()
            }
        };
        map.insert(
            key.to_string(),
            serde_json::Value::String(value.to_string()),
        );
        let content = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// Single-table key-value store backed by sqlite, for deployments that
/// already carry a database file around.
#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    path: PathBuf,
}

impl SqliteStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> PersistResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(STATE_SCHEMA)?;
        Ok(conn)
    }
}

impl StateStore for SqliteStateStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> PersistResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO session_state(key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Snapshot/restore bridge between a session and durable storage. This is
/// a full-replace contract, not a sync protocol.
pub struct PersistenceAdapter<S> {
    store: S,
    key: String,
}

impl<S: StateStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STATE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn save(&self, state: &PersistedState) -> PersistResult<()> {
        let blob = serde_json::to_string(state)?;
        self.store.set(&self.key, &blob)?;
        debug!(target: "persist", key = %self.key, bytes = blob.len(), "session state saved");
        Ok(())
    }

    /// Absent, unreadable or version-mismatched state yields `None`; the
    /// session then starts empty.
    pub fn load(&self) -> Option<PersistedState> {
        let blob = match self.store.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                warn!(target: "persist", error = %err, "failed to read session state");
                return None;
            }
        };
        match serde_json::from_str::<PersistedState>(&blob) {
            Ok(state) if state.version == STATE_VERSION => Some(state),
            Ok(state) => {
                warn!(
                    target: "persist",
                    version = state.version,
                    "unsupported state version, starting empty"
                );
                None
            }
            Err(err) => {
                warn!(target: "persist", error = %err, "corrupt session state, starting empty");
                None
            }
        }
    }
}
