//! Pipeline error types.

use thiserror::Error;

use super::state::StateError;
use crate::plugins::PluginError;

/// Step of a round that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    /// Processor at this position in the configured list.
    Process { index: usize, name: String },
    Export,
    Complete,
    /// Saving the resume round after the round completed.
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Process { index, name } => write!(f, "process #{} ({})", index, name),
            Stage::Export => f.write_str("export"),
            Stage::Complete => f.write_str("complete"),
            Stage::Persist => f.write_str("persist"),
        }
    }
}

/// Cause of a failed round.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Round {round} failed during {stage}: {source}")]
    FatalRound {
        round: u64,
        stage: Stage,
        #[source]
        source: RoundError,
    },

    #[error("Genesis hash mismatch: data directory was created for '{stored}' but the importer reports '{actual}'")]
    GenesisMismatch { stored: String, actual: String },

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Failure of `stage` while handling `round`. Cancellation is kept apart so
    /// that callers can treat it as a clean stop.
    pub fn round(round: u64, stage: Stage, source: PluginError) -> Self {
        if source.is_cancelled() {
            return Self::Cancelled;
        }
        Self::FatalRound {
            round,
            stage,
            source: RoundError::Plugin(source),
        }
    }

    /// The round completed but its resume point could not be saved.
    pub fn persist(round: u64, source: StateError) -> Self {
        Self::FatalRound {
            round,
            stage: Stage::Persist,
            source: RoundError::State(source),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
