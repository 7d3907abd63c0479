use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::image::DEFAULT_MAX_IMAGE_BYTES;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "UI2PRD_CONFIG";

/// Directory under the home directory holding config and credentials
const CONFIG_DIR_NAME: &str = ".ui2prd";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Vision model used for screenshot analysis
    pub model: String,

    /// Base URL of the Generative Language API
    pub api_base: String,

    /// Request timeout for one analysis call
    pub timeout_secs: u64,

    /// Upload ceiling for screenshots
    pub max_image_bytes: usize,

    /// Font with CJK glyphs for the GUI (region names and headers are Chinese)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cjk_font: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            cjk_font: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Loads the config from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(get_config_path()?)
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes the default config to `path` unless a file is already there
    ///
    /// With `force` an existing file is overwritten. Returns whether
    /// anything was written.
    pub fn init<P: AsRef<Path>>(path: P, force: bool) -> Result<bool> {
        let path = path.as_ref();
        if path.exists() && !force {
            log::info!("Config already exists at {:?}", path);
            return Ok(false);
        }
        Self::default().save(path)?;
        log::info!("Wrote default config to {:?}", path);
        Ok(true)
    }
}

/// Gets the directory holding config and credential files
pub fn get_config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(CONFIG_DIR_NAME))
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("config.yaml"))
}
