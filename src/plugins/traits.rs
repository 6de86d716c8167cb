//! Capability traits implemented by every pipeline stage.
//!
//! Lifecycle rules shared by all three:
//! - `init` is called exactly once, before any data method.
//! - `close` is called exactly once, even when `init` failed part way, and no
//!   data method is called afterwards.
//! - Blocking work observes the `Shutdown` handed to `init` and returns
//!   `PluginError::Cancelled` promptly once it fires.

use async_trait::async_trait;

use super::error::PluginError;
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::{BlockData, Genesis};

/// Static descriptor used for discovery and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub deprecated: bool,
    /// Example `config` document for this plugin, as JSON.
    pub sample_config: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginKind {
    Importer,
    Processor,
    Exporter,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginKind::Importer => f.write_str("importer"),
            PluginKind::Processor => f.write_str("processor"),
            PluginKind::Exporter => f.write_str("exporter"),
        }
    }
}

/// Pipeline facts available to processors and exporters at `init`.
#[derive(Debug, Clone)]
pub struct InitProvider {
    genesis: Genesis,
    next_round: u64,
}

impl InitProvider {
    pub fn new(genesis: Genesis, next_round: u64) -> Self {
        Self {
            genesis,
            next_round,
        }
    }

    pub fn genesis(&self) -> &Genesis {
        &self.genesis
    }

    /// First round the pipeline will hand to the stage.
    pub fn next_round(&self) -> u64 {
        self.next_round
    }
}

/// Produces one `BlockData` per round.
#[async_trait]
pub trait Importer: Send + 'static {
    fn metadata(&self) -> PluginMetadata;

    /// Active configuration as JSON; deserializes back into the same config.
    fn config(&self) -> String;

    async fn init(
        &mut self,
        shutdown: Shutdown,
        config: &PluginConfig,
    ) -> Result<Genesis, PluginError>;

    /// Fetch `round`, waiting for it to become available. Transient failures
    /// are retried inside the importer.
    async fn get_block(&mut self, round: u64) -> Result<BlockData, PluginError>;

    /// Called once the exporter durably accepted `block`.
    #[allow(unused_variables)]
    async fn on_complete(&mut self, block: &BlockData) -> Result<(), PluginError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PluginError>;
}

/// Transforms a round in place. Must return the same round it was given and
/// must not keep references to it.
#[async_trait]
pub trait Processor: Send + 'static {
    fn metadata(&self) -> PluginMetadata;

    fn config(&self) -> String;

    async fn init(
        &mut self,
        shutdown: Shutdown,
        provider: &InitProvider,
        config: &PluginConfig,
    ) -> Result<(), PluginError>;

    async fn process(&mut self, block: BlockData) -> Result<BlockData, PluginError>;

    async fn close(&mut self) -> Result<(), PluginError>;
}

/// Terminal consumer of each round.
#[async_trait]
pub trait Exporter: Send + 'static {
    fn metadata(&self) -> PluginMetadata;

    fn config(&self) -> String;

    async fn init(
        &mut self,
        shutdown: Shutdown,
        provider: &InitProvider,
        config: &PluginConfig,
    ) -> Result<(), PluginError>;

    /// Durably accept `block`. Returning `Ok` allows the round to be committed.
    async fn receive(&mut self, block: &BlockData) -> Result<(), PluginError>;

    async fn close(&mut self) -> Result<(), PluginError>;
}
