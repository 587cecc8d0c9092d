use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    provider::ServiceId,
};

const DATABASE_FILE: &str = "weather_app.db";

/// Credentials and endpoint for a single upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,

    /// Overrides the public endpoint, e.g. for a proxy or a local mock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// SQLite database file; defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Example TOML:
    /// [services.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

impl Config {
    /// Load config from `path`, or an empty default if it doesn't exist yet.
    /// Environment variables override file keys.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut cfg = Self::load_file(path)?;
        cfg.apply_env_with(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load only what the file contains, without environment overrides.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> anyhow::Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-explorer", "weather-explorer")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> anyhow::Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured database path, or `weather_app.db` in the platform data directory.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }

    /// Replace keys with non-empty values returned by `lookup` for each service's variable.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ServiceId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                match self.services.get_mut(id.as_str()) {
                    Some(service) => service.api_key = key,
                    None => {
                        self.services
                            .insert(id.as_str().to_string(), ServiceConfig { api_key: key, base_url: None });
                    }
                }
            }
        }
    }

    /// Set/replace the API key of a service, keeping any base URL override.
    pub fn upsert_api_key(&mut self, id: ServiceId, api_key: String) {
        self.services
            .entry(id.as_str().to_string())
            .and_modify(|service| service.api_key = api_key.clone())
            .or_insert(ServiceConfig { api_key, base_url: None });
    }

    pub fn set_base_url(&mut self, id: ServiceId, base_url: String) {
        self.services
            .entry(id.as_str().to_string())
            .and_modify(|service| service.base_url = Some(base_url.clone()))
            .or_insert(ServiceConfig { api_key: String::new(), base_url: Some(base_url) });
    }

    pub fn service_config(&self, id: ServiceId) -> Option<&ServiceConfig> {
        self.services.get(id.as_str())
    }

    /// API key for a service; absent or blank keys are a `MissingCredential`.
    pub fn api_key(&self, id: ServiceId) -> Result<&str> {
        self.service_config(id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingCredential(id))
    }

    pub fn base_url(&self, id: ServiceId) -> &str {
        self.service_config(id)
            .and_then(|cfg| cfg.base_url.as_deref())
            .unwrap_or_else(|| id.default_base_url())
    }

    pub fn is_configured(&self, id: ServiceId) -> bool {
        self.api_key(id).is_ok()
    }
}
