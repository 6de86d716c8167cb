//! Importer reading one JSON document per round from a directory.
//!
//! The layout is the one `file_writer` produces: `genesis.json` plus one file
//! per round named after `filename-pattern`. A missing round file means the
//! round is not yet available; the importer polls for it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::plugins::error::PluginError;
use crate::plugins::traits::{Importer, PluginMetadata};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::{BlockData, Genesis};

pub const PLUGIN_NAME: &str = "file_reader";

pub const GENESIS_FILE: &str = "genesis.json";

const ROUND_PLACEHOLDER: &str = "{round}";

const SAMPLE_CONFIG: &str = r#"{
  "block-dir": "/path/to/blocks",
  "filename-pattern": "block_{round}.json",
  "retry-duration-ms": 5000,
  "retry-count": 5
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileReaderConfig {
    pub block_dir: PathBuf,

    /// `{round}` is replaced with the round number.
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,

    /// Delay between polls for a round file that does not exist yet.
    #[serde(default = "default_retry_duration_ms")]
    pub retry_duration_ms: u64,

    /// Polls before giving up on a round. 0 polls forever.
    #[serde(default = "default_retry_count")]
    pub retry_count: u64,
}

pub fn default_filename_pattern() -> String {
    format!("block_{}.json", ROUND_PLACEHOLDER)
}

fn default_retry_duration_ms() -> u64 {
    5000
}

fn default_retry_count() -> u64 {
    5
}

/// File name of `round` under `pattern`.
pub fn block_file_name(pattern: &str, round: u64) -> String {
    pattern.replace(ROUND_PLACEHOLDER, &round.to_string())
}

pub fn validate_filename_pattern(pattern: &str) -> Result<(), String> {
    if !pattern.contains(ROUND_PLACEHOLDER) {
        return Err(format!(
            "filename-pattern '{}' does not contain {}",
            pattern, ROUND_PLACEHOLDER
        ));
    }
    if pattern.contains('/') {
        return Err(format!("filename-pattern '{}' must be a bare file name", pattern));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct FileReaderImporter {
    cfg: Option<FileReaderConfig>,
    shutdown: Option<Shutdown>,
}

impl FileReaderImporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn ready(&self) -> Result<(&FileReaderConfig, &Shutdown), PluginError> {
        match (&self.cfg, &self.shutdown) {
            (Some(cfg), Some(shutdown)) => Ok((cfg, shutdown)),
            _ => Err(PluginError::failed(PLUGIN_NAME, "used before init")),
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PluginError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl Importer for FileReaderImporter {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Importer for fetching blocks from a directory of JSON files.",
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
        let cfg: FileReaderConfig = config
            .unmarshal()
            .map_err(|e| PluginError::config(PLUGIN_NAME, e.to_string()))?;
        validate_filename_pattern(&cfg.filename_pattern)
            .map_err(|e| PluginError::config(PLUGIN_NAME, e))?;

        let genesis_path = cfg.block_dir.join(GENESIS_FILE);
        let genesis: Genesis = read_json(&genesis_path).await.map_err(|e| {
            PluginError::failed(
                PLUGIN_NAME,
                format!("unable to read genesis file {}: {}", genesis_path.display(), e),
            )
        })?;

        tracing::info!(
            "File reader importing from {} (network {})",
            cfg.block_dir.display(),
            genesis.network
        );

        self.cfg = Some(cfg);
        self.shutdown = Some(shutdown);
        Ok(genesis)
    }

    async fn get_block(&mut self, round: u64) -> Result<BlockData, PluginError> {
        let (cfg, shutdown) = self.ready()?;
        let path = cfg.block_dir.join(block_file_name(&cfg.filename_pattern, round));
        let delay = Duration::from_millis(cfg.retry_duration_ms);

        let mut polls = 0u64;
        loop {
            if shutdown.is_cancelled() {
                return Err(PluginError::Cancelled);
            }

            match tokio::fs::try_exists(&path).await {
                Ok(true) => {
                    let block: BlockData = read_json(&path).await?;
                    if block.round() != round {
                        return Err(PluginError::RoundMismatch {
                            expected: round,
                            actual: block.round(),
                        });
                    }
                    return Ok(block);
                }
                Ok(false) => {}
                Err(e) => return Err(e.into()),
            }

            polls += 1;
            if cfg.retry_count != 0 && polls >= cfg.retry_count {
                return Err(PluginError::failed(
                    PLUGIN_NAME,
                    format!("block file {} not found after {} polls", path.display(), polls),
                ));
            }

            tracing::debug!("Round {} not available yet, waiting {:?}", round, delay);
            if shutdown.guard(tokio::time::sleep(delay)).await.is_none() {
                return Err(PluginError::Cancelled);
            }
        }
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
