use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_DIR_NAME: &str = "groom";
const CONFIG_FILE_NAME: &str = "config.json";

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV: &str = "GROOM_GEMINI_MODEL";
pub const BASE_URL_ENV: &str = "GROOM_GEMINI_BASE_URL";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Effective settings for one process, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::resolve(&stored, |name| env::var(name).ok()))
    }

    /// Environment wins over the stored file, which wins over built-in defaults.
    /// Blank values count as unset.
    pub fn resolve(stored: &StoredConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |name: &str, fallback: &Option<String>| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| fallback.clone().filter(|value| !value.trim().is_empty()))
        };

        Self {
            gemini_api_key: pick(API_KEY_ENV, &stored.gemini_api_key),
            gemini_model: pick(MODEL_ENV, &stored.gemini_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: pick(BASE_URL_ENV, &stored.gemini_base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Self>(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("unable to determine the user config directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
