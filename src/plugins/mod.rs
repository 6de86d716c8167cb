//! Pipeline plugins: the capability traits, the registry that constructs
//! them by name, and the built-in importers, processors and exporters.
//!
//! # Architecture
//!
//! ```text
//! PipelineConfig ──► PluginRegistry ──► Box<dyn Importer>
//!                                   ├─► Vec<Box<dyn Processor>>
//!                                   └─► Box<dyn Exporter>
//! ```
//!
//! # Example Processor
//!
//! ```ignore
//! use async_trait::async_trait;
//! use ledger_conduit::plugins::{InitProvider, PluginError, PluginMetadata, Processor};
//! use ledger_conduit::shutdown::Shutdown;
//! use ledger_conduit::types::config::PluginConfig;
//! use ledger_conduit::types::data::BlockData;
//!
//! pub struct DropEmptyNotes;
//!
//! #[async_trait]
//! impl Processor for DropEmptyNotes {
//!     fn metadata(&self) -> PluginMetadata { /* ... */ }
//!     fn config(&self) -> String { "{}".to_string() }
//!     async fn init(&mut self, _: Shutdown, _: &InitProvider, _: &PluginConfig) -> Result<(), PluginError> {
//!         Ok(())
//!     }
//!     async fn process(&mut self, mut block: BlockData) -> Result<BlockData, PluginError> {
//!         block.payset.retain(|t| t.signed.txn.note.is_some());
//!         Ok(block)
//!     }
//!     async fn close(&mut self) -> Result<(), PluginError> { Ok(()) }
//! }
//!
//! registry.register_processor("drop_empty_notes", || Box::new(DropEmptyNotes))?;
//! ```

pub mod error;
pub mod exporters;
pub mod importers;
pub mod processors;
pub mod registry;
pub mod traits;

pub use error::PluginError;
pub use registry::{build_registry, PluginRegistry, RegistryError};
pub use traits::{Exporter, Importer, InitProvider, PluginKind, PluginMetadata, Processor};
