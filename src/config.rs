use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

fn default_events_channel() -> String {
    "events".to_string()
}

fn default_command_queue() -> String {
    "command".to_string()
}

fn default_poll_ms() -> u64 {
    100
}

fn default_latency_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the broadcast channel carrying model events
    #[serde(default = "default_events_channel")]
    pub events_channel: String,

    /// Name of the command queue
    #[serde(default = "default_command_queue")]
    pub command_queue: String,

    /// Worker poll interval in milliseconds (bounded receive wait)
    #[serde(default = "default_poll_ms")]
    pub worker_poll_ms: u64,

    /// Simulated processing latency for a state transition in milliseconds
    #[serde(default = "default_latency_ms")]
    pub transition_latency_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            events_channel: default_events_channel(),
            command_queue: default_command_queue(),
            worker_poll_ms: default_poll_ms(),
            transition_latency_ms: default_latency_ms(),
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config: {e}");
                Config::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(&path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }

    /// Get the config file path (in the user's config directory)
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("statebus")
            .join("config.json")
    }

    /// Bounded receive wait used by worker loops
    pub fn worker_poll(&self) -> Duration {
        Duration::from_millis(self.worker_poll_ms)
    }

    /// Simulated transition processing latency
    pub fn transition_latency(&self) -> Duration {
        Duration::from_millis(self.transition_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.events_channel, "events");
        assert_eq!(config.command_queue, "command");
        assert_eq!(config.worker_poll_ms, 100);
        assert_eq!(config.transition_latency_ms, 1000);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.events_channel, deserialized.events_channel);
        assert_eq!(config.worker_poll_ms, deserialized.worker_poll_ms);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"transition_latency_ms": 50}"#).unwrap();
        assert_eq!(config.transition_latency_ms, 50);
        assert_eq!(config.events_channel, "events");
        assert_eq!(config.worker_poll_ms, 100);
    }
}
