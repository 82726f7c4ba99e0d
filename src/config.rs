use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const BACKEND_ENV_VAR: &str = "PDFCHAT_BACKEND";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("pdfchat").join("config.json"))
    }
}

/// Resolve the backend base URL once at startup.
/// Precedence: CLI flag, then environment, then config file, then default.
pub fn resolve_backend_url(flag: Option<&str>, env: Option<String>, config: &Config) -> String {
    if let Some(url) = flag {
        return url.to_string();
    }
    if let Some(url) = env {
        if !url.is_empty() {
            return url;
        }
    }
    config
        .backend_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}
