//! Layered configuration for shelf.
//!
//! Values are merged, later sources winning:
//!
//! 1. built-in defaults,
//! 2. a TOML file (`config.toml` in the platform config directory, or an
//!    explicit path),
//! 3. `SHELF_`-prefixed environment variables, with `__` separating nested
//!    keys (`SHELF_SEARCH__DEBOUNCE_MS=350`).
//!
//! The merged result is validated before it is handed out, so everything
//! downstream can trust it.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APPLICATION: &str = "shelf";
const ENV_PREFIX: &str = "SHELF_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "shelf.sqlite3";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APPLICATION)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub spin: SpinConfig,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
            spin: SpinConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Pool size; the store picks its own when unset.
    pub max_connections: Option<u32>,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(".shelf").join(DATABASE_FILE));
        Self {
            path,
            max_connections: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a query is issued.
    pub debounce_ms: u64,
    /// Shorter input clears the results without querying.
    pub min_query_len: usize,
}
impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            min_query_len: 3,
        }
    }
}
impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    pub min_rotations: u32,
    pub max_rotations: u32,
}
impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            min_rotations: 2,
            max_rotations: 20,
        }
    }
}
impl SpinConfig {
    /// Whole turns the wheel makes before settling.
    pub fn rotations(&self) -> RangeInclusive<u32> {
        self.min_rotations..=self.max_rotations
    }
}

impl Config {
    /// Where the configuration file is looked for when no path is given.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from defaults, the TOML file and the environment.
    ///
    /// With `path` unset, a missing default file is not an error. An
    /// explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// The merged sources, before extraction.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = match path {
            Some(path) => Some(Toml::file_exact(path)),
            None => Self::default_path().map(Toml::file),
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(file);
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field, reason| exn::Exn::from(ErrorKind::Invalid { field, reason });
        if self.spin.min_rotations < 1 {
            return Err(invalid("spin.min_rotations", "must be at least 1"));
        }
        if self.spin.min_rotations > self.spin.max_rotations {
            return Err(invalid("spin.max_rotations", "must not be less than spin.min_rotations"));
        }
        if self.search.min_query_len < 1 {
            return Err(invalid("search.min_query_len", "must be at least 1"));
        }
        if self.database.max_connections == Some(0) {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        Ok(())
    }
}
