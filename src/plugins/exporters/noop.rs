use async_trait::async_trait;

use crate::plugins::error::PluginError;
use crate::plugins::traits::{Exporter, InitProvider, PluginMetadata};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::BlockData;

pub const PLUGIN_NAME: &str = "noop";

/// Accepts every round and discards it.
#[derive(Debug, Default)]
pub struct NoopExporter {
    last_round: Option<u64>,
}

impl NoopExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_round(&self) -> Option<u64> {
        self.last_round
    }
}

#[async_trait]
impl Exporter for NoopExporter {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Noop exporter. Accepts and discards every round.",
            deprecated: false,
            sample_config: "{}",
        }
    }

    fn config(&self) -> String {
        "{}".to_string()
    }

    async fn init(
        &mut self,
        _shutdown: Shutdown,
        _provider: &InitProvider,
        _config: &PluginConfig,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    async fn receive(&mut self, block: &BlockData) -> Result<(), PluginError> {
        self.last_round = Some(block.round());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
