use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::{flog_debug, Error, Result};

/// Client configuration for reaching the orchestration gateway.
///
/// Loaded from `~/.flowgate/flowgate.toml`; `FLOWGATE_ENDPOINT` and
/// `FLOWGATE_TOKEN` env vars override the file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub token: Option<String>,
    #[serde(default = "default_tenant")]
    pub tenant: String,
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_queue")]
    pub queue: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:12345/gateway".to_string()
}

fn default_tenant() -> String {
    "default".to_string()
}

fn default_project() -> String {
    "flowgate".to_string()
}

fn default_user() -> String {
    "flowgate".to_string()
}

fn default_queue() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            tenant: default_tenant(),
            project: default_project(),
            user: default_user(),
            queue: default_queue(),
        }
    }
}

impl Config {
    pub fn flowgate_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".flowgate"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::flowgate_dir()?.join("flowgate.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        flog_debug!("Config::load path={}", path.display());
        let mut config = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            flog_debug!("Config file not found, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply env var overrides on top of file/default values.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("FLOWGATE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var("FLOWGATE_TOKEN") {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::flowgate_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        flog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs() -> Result<()> {
        let dir = Self::flowgate_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
