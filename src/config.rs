//! Configuration loading for the briefcast client.
//!
//! All tunables are centralized here and loaded from `conf/config.toml` if
//! present. Any missing or invalid entries fall back to sensible defaults so
//! the client can always start.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BRIEFCAST_CONFIG_PATH";
/// Environment variable that overrides the persisted-data directory.
pub const DATA_DIR_ENV: &str = "BRIEFCAST_DATA_DIR";
/// Environment variable holding an env-filter directive; when set it wins
/// over the config file's log level.
pub const LOG_ENV: &str = "BRIEFCAST_LOG";

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            catalog_base_url: default_catalog_base_url(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Directory that holds the persisted key-value documents. The
    /// environment override wins over the config file so tests and
    /// secondary profiles can point elsewhere.
    pub fn data_dir(&self) -> PathBuf {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(&self.data_dir),
        }
    }
}

/// Resolve the config file path, honoring the environment override.
pub fn config_path() -> PathBuf {
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from("conf/config.toml"),
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            info!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://us-central1-summaristt.cloudfunctions.net".to_string()
}

fn default_data_dir() -> String {
    ".briefcast".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", label)
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Path::new("conf/definitely-not-here.toml"));
        assert_eq!(cfg.catalog_base_url, default_catalog_base_url());
        assert_eq!(cfg.data_dir, default_data_dir());
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let cfg: AppConfig = toml::from_str("log_level = \"warn\"").unwrap();
        assert_eq!(cfg.log_level, LogLevel::Warn);
        assert_eq!(cfg.catalog_base_url, default_catalog_base_url());
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = [not toml").unwrap();
        let cfg = load_config(&path);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.data_dir, default_data_dir());
    }
}
