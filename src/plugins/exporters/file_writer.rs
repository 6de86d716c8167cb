//! Exporter writing each round as a pretty JSON file.
//!
//! Output directory layout matches what `file_reader` consumes, so a
//! directory written here can be replayed by another pipeline.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::plugins::error::PluginError;
use crate::plugins::importers::file_reader::{
    block_file_name, default_filename_pattern, validate_filename_pattern, GENESIS_FILE,
};
use crate::plugins::traits::{Exporter, InitProvider, PluginMetadata};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::BlockData;

pub const PLUGIN_NAME: &str = "file_writer";

const SAMPLE_CONFIG: &str = r#"{
  "block-dir": "/path/to/blocks",
  "filename-pattern": "block_{round}.json",
  "drop-certificate": true
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileWriterConfig {
    pub block_dir: PathBuf,

    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,

    /// Strip the certificate before writing.
    #[serde(default)]
    pub drop_certificate: bool,
}

#[derive(Debug, Default)]
pub struct FileWriterExporter {
    cfg: Option<FileWriterConfig>,
}

impl FileWriterExporter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Write through `<name>.tmp` and rename, so a reader polling for `path`
/// never sees a partial document.
async fn write_pretty<T: Serialize>(path: PathBuf, value: &T) -> Result<(), PluginError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

#[async_trait]
impl Exporter for FileWriterExporter {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Exporter for writing every round to a JSON file.",
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
        _shutdown: Shutdown,
        provider: &InitProvider,
        config: &PluginConfig,
    ) -> Result<(), PluginError> {
        let cfg: FileWriterConfig = config
            .unmarshal()
            .map_err(|e| PluginError::config(PLUGIN_NAME, e.to_string()))?;
        validate_filename_pattern(&cfg.filename_pattern)
            .map_err(|e| PluginError::config(PLUGIN_NAME, e))?;

        tokio::fs::create_dir_all(&cfg.block_dir).await?;
        write_pretty(cfg.block_dir.join(GENESIS_FILE), provider.genesis()).await?;

        tracing::info!(
            "File writer exporting to {} starting at round {}",
            cfg.block_dir.display(),
            provider.next_round()
        );

        self.cfg = Some(cfg);
        Ok(())
    }

    async fn receive(&mut self, block: &BlockData) -> Result<(), PluginError> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PluginError::failed(PLUGIN_NAME, "used before init"))?;
        let path = cfg
            .block_dir
            .join(block_file_name(&cfg.filename_pattern, block.round()));

        if cfg.drop_certificate && block.certificate.is_some() {
            let mut stripped = block.clone();
            stripped.certificate = None;
            write_pretty(path, &stripped).await
        } else {
            write_pretty(path, block).await
        }
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::importers::file_reader::{self, FileReaderImporter};
    use crate::plugins::traits::Importer;
    use crate::shutdown;
    use crate::types::data::{Certificate, Genesis, SignedTxnWithAD, Transaction, TxType};
    use serde_json::json;

    fn provider() -> InitProvider {
        InitProvider::new(
            Genesis {
                id: "mainnet-v1.0".to_string(),
                network: "mainnet".to_string(),
                proto: "future".to_string(),
                hash: "wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8=".to_string(),
            },
            10,
        )
    }

    fn block(round: u64) -> BlockData {
        let mut txn = Transaction::new(TxType::Payment, "ALICE");
        txn.receiver = Some("BOB".to_string());
        txn.amount = 25;
        let mut block = BlockData::empty(round);
        block.payset.push(SignedTxnWithAD::new(txn).into());
        block.certificate = Some(Certificate {
            round,
            ..Default::default()
        });
        block
    }

    async fn exporter(dir: &std::path::Path, extra: serde_json::Value) -> FileWriterExporter {
        let mut config = json!({"block-dir": dir});
        if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        let (_trigger, shutdown) = shutdown::channel();
        let mut exporter = FileWriterExporter::new();
        exporter
            .init(shutdown, &provider(), &PluginConfig::new(PLUGIN_NAME, config))
            .await
            .unwrap();
        exporter
    }

    #[tokio::test]
    async fn test_output_replays_through_file_reader() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = exporter(dir.path(), json!({})).await;
        writer.receive(&block(10)).await.unwrap();
        writer.receive(&block(11)).await.unwrap();

        let (_trigger, shutdown) = shutdown::channel();
        let mut reader = FileReaderImporter::new();
        let genesis = reader
            .init(
                shutdown,
                &PluginConfig::new(file_reader::PLUGIN_NAME, json!({"block-dir": dir.path()})),
            )
            .await
            .unwrap();
        assert_eq!(&genesis, provider().genesis());

        assert_eq!(reader.get_block(10).await.unwrap(), block(10));
        assert_eq!(reader.get_block(11).await.unwrap(), block(11));
    }

    #[tokio::test]
    async fn test_only_complete_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = exporter(dir.path(), json!({})).await;
        for round in 10..13 {
            writer.receive(&block(round)).await.unwrap();
        }

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["block_10.json", "block_11.json", "block_12.json", "genesis.json"]
        );
        for name in &names {
            let content = std::fs::read(dir.path().join(name)).unwrap();
            serde_json::from_slice::<serde_json::Value>(&content).unwrap();
        }
    }

    #[tokio::test]
    async fn test_drop_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = exporter(dir.path(), json!({"drop-certificate": true})).await;
        writer.receive(&block(3)).await.unwrap();

        let written: BlockData =
            serde_json::from_slice(&std::fs::read(dir.path().join("block_3.json")).unwrap())
                .unwrap();
        assert!(written.certificate.is_none());
        assert_eq!(written.payset.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_trigger, shutdown) = shutdown::channel();
        let err = FileWriterExporter::new()
            .init(
                shutdown,
                &provider(),
                &PluginConfig::new(
                    PLUGIN_NAME,
                    json!({"block-dir": dir.path(), "filename-pattern": "out.json"}),
                ),
            )
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
