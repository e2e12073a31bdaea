use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_SEARCH_LIMIT: u8 = 5;

pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
pub const API_URL_ENV: &str = "OPENWEATHERMAP_API_URL";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// api_url = "https://api.openweathermap.org"
/// search_limit = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub search_limit: Option<u8>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityboard", "cityboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Default location of the key-value store holding the tracked city names.
    pub fn store_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("store.json"))
    }

    /// Apply `OPENWEATHERMAP_API_KEY` / `OPENWEATHERMAP_API_URL` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(env::var(API_KEY_ENV).ok(), env::var(API_URL_ENV).ok());
        self
    }

    fn apply_overrides(&mut self, api_key: Option<String>, api_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
        }
    }

    /// Returns the API key, or an error pointing at `cityboard configure`.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `cityboard configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn search_limit(&self) -> u8 {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    pub fn is_configured(&self) -> bool {
        self.require_api_key().is_ok()
    }
}
