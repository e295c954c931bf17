use crate::error::RuntimeResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use twig_events::RegistryConfig;

pub const DEFAULT_CONFIG_NAME: &str = "twig.config.json";

/// What happens to a state update issued while a commit is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentrancyPolicy {
    /// Apply after the current commit, in arrival order
    #[default]
    Queue,
    Reject,
}

/// Twig application configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub reentrancy: ReentrancyPolicy,

    /// Upper bound on updates applied by one flush of the update queue
    #[serde(default = "default_max_updates_per_flush")]
    pub max_updates_per_flush: usize,

    #[serde(default)]
    pub events: RegistryConfig,
}

fn default_max_updates_per_flush() -> usize {
    100
}

impl AppConfig {
    /// Load config from a directory, falling back to defaults if there is no config file
    pub fn load(dir: impl AsRef<Path>) -> RuntimeResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json_str(&content)
        } else {
            Ok(AppConfig::default())
        }
    }

    pub fn from_json_str(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reentrancy: ReentrancyPolicy::default(),
            max_updates_per_flush: default_max_updates_per_flush(),
            events: RegistryConfig::default(),
        }
    }
}
