// YAML configuration with defaults for every field

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::page::DEFAULT_PAGE_SIZE;
use crate::qr::{ErrorCorrection, QrOptions};

const APP_DIR: &str = "assetstore";
const CONFIG_FILE: &str = "assetstore.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `.assetstore/` data folder
    pub store_path: PathBuf,
    pub page_size: usize,
    pub toast_seconds: u64,
    pub qr: QrConfig,
    /// Identity used to resolve the session when `--user` is not given
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Edge length in pixels for a single code
    pub size: u32,
    /// Edge length in pixels for codes on a print sheet
    pub batch_size: u32,
    pub ec_level: ErrorCorrection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            toast_seconds: 3,
            qr: QrConfig::default(),
            user_email: None,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        let options = QrOptions::default();
        Self {
            size: options.size,
            batch_size: 150,
            ec_level: options.ec_level,
        }
    }
}

impl QrConfig {
    pub fn options(&self) -> QrOptions {
        QrOptions {
            size: self.size,
            ec_level: self.ec_level,
        }
    }

    pub fn batch_options(&self) -> QrOptions {
        QrOptions {
            size: self.batch_size,
            ec_level: self.ec_level,
        }
    }
}

impl Config {
    /// `<config dir>/assetstore/assetstore.yml`, when a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path, or from the default location
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}
