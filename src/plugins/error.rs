//! Plugin error types.

use thiserror::Error;

use super::importers::node::SourceError;
use super::processors::filter::FilterError;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid configuration for plugin '{plugin}': {message}")]
    Config { plugin: String, message: String },

    #[error("Plugin '{plugin}' failed: {message}")]
    Failed { plugin: String, message: String },

    #[error("Round {round} not fetched after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        round: u64,
        attempts: u32,
        last_error: String,
    },

    #[error("Expected round {expected}, got {actual}")]
    RoundMismatch { expected: u64, actual: u64 },

    #[error("Block source error: {0}")]
    Source(#[from] SourceError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl PluginError {
    pub fn config(plugin: &str, message: impl Into<String>) -> Self {
        Self::Config {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }

    pub fn failed(plugin: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PluginError::Cancelled)
    }

    /// Errors that mean the plugin was configured wrong rather than that a
    /// round could not be handled.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PluginError::Config { .. })
            || matches!(self, PluginError::Filter(e) if e.is_configuration())
    }
}
