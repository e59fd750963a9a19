use thiserror::Error;

use crate::state::AppState;

/// Application-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur during
/// bus and state-machine operation. They provide context and can be chained
/// with anyhow.

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Address already in use: {0}")]
    AddressInUse(String),

    #[error("Bus registry is closed")]
    Closed,

    #[error("Queue already has an attached consumer: {0}")]
    ConsumerAttached(String),

    #[error("Channel disconnected")]
    Disconnected,

    #[error("Failed to encode command for the queue")]
    EncodeFailed(#[source] serde_json::Error),

    #[error("Failed to decode queue message")]
    DecodeFailed(#[source] serde_json::Error),

    #[error("Received frame is not valid UTF-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    #[error("Failed to spawn worker thread")]
    ThreadSpawnFailed(#[source] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: AppState, to: AppState },

    #[error("Unknown state: {0}")]
    UnknownState(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = BusError::AddressInUse("inproc://events".to_string());
        assert_eq!(err.to_string(), "Address already in use: inproc://events");

        let err = TransitionError::InvalidTransition {
            from: AppState::A,
            to: AppState::C,
        };
        assert_eq!(err.to_string(), "Invalid transition: A -> C");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_err = ConfigError::LoadFailed {
            path: "/test/config.json".to_string(),
            source: Box::new(io_err),
        };

        assert!(config_err.source().is_some());
        assert_eq!(
            config_err.to_string(),
            "Failed to load configuration from /test/config.json"
        );
    }
}
