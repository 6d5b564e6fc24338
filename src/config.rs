use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TARGET_APP_NAME: &str = "Teams - Chat";
const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Static daemon configuration read once at startup from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_secs: u64,
    pub list_command: String,
    pub list_args: Vec<String>,
    pub activate_command: String,
    pub activate_args: Vec<String>,
    pub command_timeout_secs: u64,
    pub default_target_app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            list_command: "wmctrl".to_string(),
            list_args: vec!["-l".to_string()],
            activate_command: "wmctrl".to_string(),
            activate_args: vec!["-a".to_string()],
            command_timeout_secs: 5,
            default_target_app_name: DEFAULT_TARGET_APP_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}
