pub mod pipeline;

pub use pipeline::{PipelineConfig, PluginConfig, CONFIG_FILE_NAME};
