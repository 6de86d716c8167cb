use async_trait::async_trait;

use crate::plugins::error::PluginError;
use crate::plugins::traits::{InitProvider, PluginMetadata, Processor};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::BlockData;

pub const PLUGIN_NAME: &str = "noop";

/// Passes every round through unchanged.
#[derive(Debug, Default)]
pub struct NoopProcessor;

impl NoopProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for NoopProcessor {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Noop processor. Passes rounds through unchanged.",
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

    async fn process(&mut self, block: BlockData) -> Result<BlockData, PluginError> {
        Ok(block)
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
