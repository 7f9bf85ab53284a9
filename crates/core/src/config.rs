//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

use crate::save::DEFAULT_SNAPSHOT_FILE;

/// Directory under the platform config/data roots used by the app.
pub const APP_DIR: &str = "parkline";

/// Prefix for environment overrides, e.g. `PARKLINE_SNAPSHOT_PATH`.
pub const ENV_PREFIX: &str = "PARKLINE";

const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Parkline configuration.
# Every key is optional; environment variables prefixed with PARKLINE_ win.

# Where the lot and waiting queue are stored between runs.
# snapshot_path = "/path/to/parking_data.json"

# Directory receiving parkline.log.
# log_dir = "logs"

# Capacity suggested when no snapshot exists yet.
# default_capacity = 10
"#;

/// Runtime settings resolved from defaults, the config file, and the environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Snapshot file holding the lot and queue.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Directory for log output.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Capacity pre-filled in the first-run prompt.
    #[serde(default)]
    pub default_capacity: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            log_dir: default_log_dir(),
            default_capacity: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration layering `path` (if present) and the environment over defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_config_at(&config_path())
}

fn ensure_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

fn default_snapshot_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SNAPSHOT_FILE)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.log_dir, default_log_dir());
        assert!(config.snapshot_path.ends_with(DEFAULT_SNAPSHOT_FILE));
        assert_eq!(config.default_capacity, None);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "snapshot_path = \"/tmp/lot.json\"\ndefault_capacity = 4\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/lot.json"));
        assert_eq!(config.default_capacity, Some(4));
        assert_eq!(config.log_dir, default_log_dir());
        Ok(())
    }

    #[test]
    fn default_template_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        ensure_config_at(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.log_dir, default_log_dir());

        // An existing file is left alone.
        fs::write(&path, "default_capacity = 2\n")?;
        ensure_config_at(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.default_capacity, Some(2));
        Ok(())
    }
}
