use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chatline::models::GeoPoint;
use chatline::transport::DEFAULT_PAGE_SIZE;

pub const SERVER_ENV: &str = "CHATLINE_SERVER";
const DEFAULT_SERVER: &str = "http://localhost:7070";
const DEFAULT_LOG_FILE: &str = "chatline.log";
const SETTINGS_FILE: &str = "settings.json";

static CONFIG_DIR_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub page_size: usize,
    /// Fixed position used for geo sharing, as "lat,lon"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server_url: DEFAULT_SERVER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            location: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Settings from the config directory, or defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let settings: Settings = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// The environment beats the settings file for the server address.
    pub fn apply_env(&mut self) {
        if let Ok(server) = env::var(SERVER_ENV) {
            if !server.trim().is_empty() {
                self.server_url = server.trim().to_string();
            }
        }
    }

    pub fn geo_point(&self) -> Result<Option<GeoPoint>> {
        match &self.location {
            Some(raw) => raw
                .parse::<GeoPoint>()
                .map(Some)
                .map_err(|e| anyhow!("Invalid location setting: {}", e)),
            None => Ok(None),
        }
    }
}

pub fn set_config_dir_override(dir: PathBuf) {
    let _ = CONFIG_DIR_OVERRIDE.set(dir);
}

pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE.get() {
        return Ok(dir.clone());
    }
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("chatline");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}
