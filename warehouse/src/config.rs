//! Configuration for the loader.
//!
//! Config file resolution order:
//! 1. Explicit path passed to Config::load()
//! 2. SPARKIFY_CONFIG environment variable
//! 3. ./sparkify.toml in the working directory
//! 4. Platform config dir: <config_dir>/sparkify/config.toml
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SPARKIFY_CONFIG";

/// Time zone used to break event timestamps into calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    /// The host's local zone. Results depend on the machine running the load.
    #[default]
    Local,
    Utc,
    /// Fixed offset in seconds east of UTC.
    Offset(i32),
}

impl Clock {
    /// Convert epoch milliseconds to a zoned datetime in this clock.
    ///
    /// Returns None when the value is outside chrono's representable range
    /// or the offset is invalid.
    pub fn at_millis(&self, millis: i64) -> Option<DateTime<FixedOffset>> {
        let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
        let offset = match self {
            Clock::Local => *Local.from_utc_datetime(&utc.naive_utc()).offset(),
            Clock::Utc => FixedOffset::east_opt(0)?,
            Clock::Offset(secs) => FixedOffset::east_opt(*secs)?,
        };
        Some(utc.with_timezone(&offset))
    }
}

/// Loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DuckDB database file holding the star schema.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Root of the song metadata tree.
    #[serde(default = "default_song_data")]
    pub song_data: PathBuf,

    /// Root of the activity log tree.
    #[serde(default = "default_log_data")]
    pub log_data: PathBuf,

    #[serde(default)]
    pub clock: Clock,
}

fn default_database() -> PathBuf {
    PathBuf::from("sparkify.duckdb")
}

fn default_song_data() -> PathBuf {
    PathBuf::from("data/song_data")
}

fn default_log_data() -> PathBuf {
    PathBuf::from("data/log_data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            song_data: default_song_data(),
            log_data: default_log_data(),
            clock: Clock::default(),
        }
    }
}

impl Config {
    /// Create a config with every path rooted under `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            database: root.join(default_database()),
            song_data: root.join(default_song_data()),
            log_data: root.join(default_log_data()),
            clock: Clock::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load config using the standard resolution order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit)? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file.
    ///
    /// Relative paths inside the file resolve against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            config.database = rebase(base, &config.database);
            config.song_data = rebase(base, &config.song_data);
            config.log_data = rebase(base, &config.log_data);
        }
        Ok(config)
    }

    /// Save config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    // 1. Explicit path must exist
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    // 2. Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::Config(format!(
                "{} points to a missing file: {}",
                CONFIG_ENV_VAR,
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    // 3. Working directory
    let local = PathBuf::from("sparkify.toml");
    if local.exists() {
        return Ok(Some(local));
    }

    // 4. Platform config directory
    if let Some(proj_dirs) = ProjectDirs::from("", "", "sparkify") {
        let path = proj_dirs.config_dir().join("config.toml");
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}
