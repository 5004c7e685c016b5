use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, Result};

/// Top-level configuration, loaded from `waypoint.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WaypointConfig {
    pub planner: PlannerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSection {
    /// Base URL of the external route optimizer.
    pub endpoint: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSection {
    #[serde(default = "default_time_budget_min")]
    pub time_budget_min: u32,
    #[serde(default = "default_require_anchor")]
    pub require_anchor: bool,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            time_budget_min: default_time_budget_min(),
            require_anchor: default_require_anchor(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Json
}

fn default_state_path() -> PathBuf {
    PathBuf::from("data/session.json")
}

fn default_time_budget_min() -> u32 {
    120
}

fn default_require_anchor() -> bool {
    true
}

pub fn load_waypoint_config(path: impl AsRef<Path>) -> Result<WaypointConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
