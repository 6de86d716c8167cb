//! Importer pulling rounds from a ledger node through a [`BlockSource`].
//!
//! Two modes:
//! - `archival` (default): fetches header, payset and certificate.
//! - `follower`: also fetches the state delta of every round after genesis and,
//!   once a round is durably exported, moves the node's sync round forward so
//!   it can discard older state.
//!
//! Failed attempts are retried immediately up to `retries` times. Decode
//! failures are terminal.

pub mod source;

pub use source::{BlockResponse, BlockSource, SourceError};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::plugins::error::PluginError;
use crate::plugins::registry::{PluginRegistry, RegistryError};
use crate::plugins::traits::{Importer, PluginMetadata};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::{BlockData, Genesis};

pub const PLUGIN_NAME: &str = "node";

const SAMPLE_CONFIG: &str = r#"{
  "mode": "follower",
  "retries": 5
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Archival,
    Follower,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "archival" => Ok(Mode::Archival),
            "follower" => Ok(Mode::Follower),
            other => Err(format!("unknown mode '{}', expected archival or follower", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    #[serde(default)]
    pub mode: String,

    /// Attempts per round before the round is given up.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_retries() -> u32 {
    5
}

pub struct NodeImporter {
    source: Arc<dyn BlockSource>,
    cfg: Option<NodeConfig>,
    mode: Mode,
    shutdown: Option<Shutdown>,
}

impl NodeImporter {
    pub fn new(source: Arc<dyn BlockSource>) -> Self {
        Self {
            source,
            cfg: None,
            mode: Mode::default(),
            shutdown: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    async fn fetch_once(&self, round: u64) -> Result<BlockData, SourceError> {
        self.source.status_after_block(round.saturating_sub(1)).await?;

        let started = Instant::now();
        let response = self.source.block(round).await?;
        tracing::debug!("Fetched round {} in {:?}", round, started.elapsed());

        if response.block.round != round {
            return Err(SourceError::Decode(format!(
                "requested round {} but source returned {}",
                round, response.block.round
            )));
        }

        let delta = if self.mode == Mode::Follower && round != 0 {
            Some(self.source.delta(round).await?)
        } else {
            None
        };

        Ok(BlockData {
            header: response.block,
            payset: response.payset,
            certificate: response.cert,
            delta,
        })
    }
}

/// Register the node importer against `source`. The source is a live
/// connection, so the plugin cannot be part of the static registry.
pub fn register(
    registry: &mut PluginRegistry,
    source: Arc<dyn BlockSource>,
) -> Result<(), RegistryError> {
    registry.register_importer(PLUGIN_NAME, move || {
        Box::new(NodeImporter::new(source.clone()))
    })
}

#[async_trait]
impl Importer for NodeImporter {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Importer for fetching blocks from a ledger node in archival or follower mode.",
            deprecated: false,
            sample_config: SAMPLE_CONFIG,
        }
    }

    fn config(&self) -> String {
        self.cfg
            .as_ref()
            .and_then(|cfg| serde_json::to_string(cfg).ok())
            .unwrap_or_default()
    }

    async fn init(
        &mut self,
        shutdown: Shutdown,
        config: &PluginConfig,
    ) -> Result<Genesis, PluginError> {
        let cfg: NodeConfig = config
            .unmarshal()
            .map_err(|e| PluginError::config(PLUGIN_NAME, e.to_string()))?;
        let mode: Mode = cfg
            .mode
            .parse()
            .map_err(|e: String| PluginError::config(PLUGIN_NAME, e))?;
        if cfg.retries == 0 {
            return Err(PluginError::config(PLUGIN_NAME, "retries must be at least 1"));
        }

        let genesis = match shutdown.guard(self.source.genesis()).await {
            Some(result) => result?,
            None => return Err(PluginError::Cancelled),
        };

        tracing::info!(
            "Node importer running in {:?} mode against network {}",
            mode,
            genesis.network
        );

        self.mode = mode;
        self.cfg = Some(cfg);
        self.shutdown = Some(shutdown);
        Ok(genesis)
    }

    async fn get_block(&mut self, round: u64) -> Result<BlockData, PluginError> {
        let (retries, shutdown) = match (&self.cfg, &self.shutdown) {
            (Some(cfg), Some(shutdown)) => (cfg.retries, shutdown.clone()),
            _ => return Err(PluginError::failed(PLUGIN_NAME, "used before init")),
        };

        let mut last_error = String::new();
        for attempt in 1..=retries {
            if shutdown.is_cancelled() {
                return Err(PluginError::Cancelled);
            }

            match shutdown.guard(self.fetch_once(round)).await {
                None => return Err(PluginError::Cancelled),
                Some(Ok(block)) => return Ok(block),
                Some(Err(e)) if e.is_retryable() => {
                    tracing::warn!(
                        "Fetch of round {} failed (attempt {}/{}): {}",
                        round,
                        attempt,
                        retries,
                        e
                    );
                    last_error = e.to_string();
                }
                Some(Err(e)) => {
                    tracing::error!("Fetch of round {} failed permanently: {}", round, e);
                    return Err(e.into());
                }
            }
        }

        tracing::error!("Giving up on round {} after {} attempts", round, retries);
        Err(PluginError::RetriesExhausted {
            round,
            attempts: retries,
            last_error,
        })
    }

    async fn on_complete(&mut self, block: &BlockData) -> Result<(), PluginError> {
        if self.mode != Mode::Follower {
            return Ok(());
        }
        let shutdown = self
            .shutdown
            .clone()
            .ok_or_else(|| PluginError::failed(PLUGIN_NAME, "used before init"))?;
        let next = block.round() + 1;
        match shutdown.guard(self.source.set_sync_round(next)).await {
            None => return Err(PluginError::Cancelled),
            Some(result) => result?,
        }
        tracing::debug!("Advanced sync round to {}", next);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
