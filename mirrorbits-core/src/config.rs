use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AdminError, Result};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CoreConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub geo: GeoConfig,
}

impl CoreConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(path).map_err(|e| {
                AdminError::Configuration(format!("reading config file {}: {e}", path.display()))
            })?;
            Self::from_toml(&text).map_err(|e| {
                AdminError::Configuration(format!("parsing config file {}: {e}", path.display()))
            })?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<CoreConfig>(text)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.store.path = absolutize(root, &self.store.path);
        self.daemon.pid_file = absolutize(root, &self.daemon.pid_file);
        self.logbook.path = absolutize(root, &self.logbook.path);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "StoreConfig::default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("mirrorbits.db")
    }

    fn default_busy_timeout_ms() -> u64 {
        5_000
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            busy_timeout_ms: Self::default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "DaemonConfig::default_pid_file")]
    pub pid_file: PathBuf,
}

impl DaemonConfig {
    fn default_pid_file() -> PathBuf {
        PathBuf::from("/var/run/mirrorbits/mirrorbits.pid")
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pid_file: Self::default_pid_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
}

impl LogbookConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_path() -> PathBuf {
        PathBuf::from("logbook/admin.jsonl")
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            path: Self::default_path(),
        }
    }
}

/// Static geolocation table, keyed by hostname or textual IP address.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GeoConfig {
    #[serde(default)]
    pub hosts: BTreeMap<String, GeoEntry>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct GeoEntry {
    #[serde(default)]
    pub latitude: f32,
    #[serde(default)]
    pub longitude: f32,
    #[serde(default)]
    pub continent_code: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub asnum: u32,
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
