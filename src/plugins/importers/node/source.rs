//! Upstream block source boundary consumed by the node importer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::data::{BlockHeader, Certificate, Genesis, SignedTxnInBlock, StateDelta};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Round {0} not available")]
    NotFound(u64),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Check if another attempt at the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Transport(_) => true,
            SourceError::NotFound(_) => true,
            // Retrying returns the same bytes
            SourceError::Decode(_) => false,
        }
    }
}

/// Block as served by the upstream source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockResponse {
    pub block: BlockHeader,
    #[serde(default)]
    pub payset: Vec<SignedTxnInBlock>,
    #[serde(default)]
    pub cert: Option<Certificate>,
}

#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn genesis(&self) -> Result<Genesis, SourceError>;

    /// Wait until the source has a block after `round`.
    async fn status_after_block(&self, round: u64) -> Result<u64, SourceError>;

    async fn block(&self, round: u64) -> Result<BlockResponse, SourceError>;

    async fn delta(&self, round: u64) -> Result<StateDelta, SourceError>;

    /// Let the source drop state older than `round`.
    async fn set_sync_round(&self, round: u64) -> Result<(), SourceError>;
}
