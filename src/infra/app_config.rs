use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::segmenter;

/// Default service address, matching the development server.
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the remote pipeline service.
    pub api_base_url: String,
    /// Language tags rendered as code when they open a fenced block.
    pub code_languages: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            code_languages: segmenter::DEFAULT_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub fn load_config() -> AppConfig {
    let mut config = read_config_file().unwrap_or_default();
    if let Ok(url) = std::env::var("CASEFORGE_API_URL") {
        config.api_base_url = url;
    }
    config
}

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string(config_path()).ok()?;
    toml::from_str(&contents).ok()
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).unwrap_or_default();
    std::fs::write(path, contents)
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CASEFORGE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("CASEFORGE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("CaseForge");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("CaseForge");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("caseforge");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("caseforge");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".caseforge")
}
