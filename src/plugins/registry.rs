//! Plugin registration system.
//!
//! The registry maps configured plugin names to constructors, one table per
//! plugin kind. It is built once at startup and only read afterwards.

use std::collections::BTreeMap;

use thiserror::Error;

use super::exporters::{file_writer, noop as noop_exporter};
use super::importers::file_reader;
use super::processors::{filter, noop as noop_processor};
use super::traits::{Exporter, Importer, PluginKind, PluginMetadata, Processor};

pub type ImporterConstructor = Box<dyn Fn() -> Box<dyn Importer> + Send + Sync>;
pub type ProcessorConstructor = Box<dyn Fn() -> Box<dyn Processor> + Send + Sync>;
pub type ExporterConstructor = Box<dyn Fn() -> Box<dyn Exporter> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: PluginKind, name: String },

    #[error("no {kind} named '{name}' is registered")]
    NotFound { kind: PluginKind, name: String },
}

/// Registry of all constructible plugins, built at startup.
pub struct PluginRegistry {
    importers: BTreeMap<String, ImporterConstructor>,
    processors: BTreeMap<String, ProcessorConstructor>,
    exporters: BTreeMap<String, ExporterConstructor>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            importers: BTreeMap::new(),
            processors: BTreeMap::new(),
            exporters: BTreeMap::new(),
        }
    }

    pub fn register_importer<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Importer> + Send + Sync + 'static,
    {
        insert(&mut self.importers, PluginKind::Importer, name.into(), Box::new(ctor))
    }

    pub fn register_processor<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Processor> + Send + Sync + 'static,
    {
        insert(&mut self.processors, PluginKind::Processor, name.into(), Box::new(ctor))
    }

    pub fn register_exporter<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Exporter> + Send + Sync + 'static,
    {
        insert(&mut self.exporters, PluginKind::Exporter, name.into(), Box::new(ctor))
    }

    /// Construct a fresh importer instance.
    pub fn importer(&self, name: &str) -> Result<Box<dyn Importer>, RegistryError> {
        resolve(&self.importers, PluginKind::Importer, name).map(|ctor| ctor())
    }

    pub fn processor(&self, name: &str) -> Result<Box<dyn Processor>, RegistryError> {
        resolve(&self.processors, PluginKind::Processor, name).map(|ctor| ctor())
    }

    pub fn exporter(&self, name: &str) -> Result<Box<dyn Exporter>, RegistryError> {
        resolve(&self.exporters, PluginKind::Exporter, name).map(|ctor| ctor())
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<&str> {
        match kind {
            PluginKind::Importer => self.importers.keys().map(String::as_str).collect(),
            PluginKind::Processor => self.processors.keys().map(String::as_str).collect(),
            PluginKind::Exporter => self.exporters.keys().map(String::as_str).collect(),
        }
    }

    /// Metadata of every registered plugin of one kind.
    pub fn metadata(&self, kind: PluginKind) -> Vec<PluginMetadata> {
        match kind {
            PluginKind::Importer => self.importers.values().map(|c| c().metadata()).collect(),
            PluginKind::Processor => self.processors.values().map(|c| c().metadata()).collect(),
            PluginKind::Exporter => self.exporters.values().map(|c| c().metadata()).collect(),
        }
    }

    /// Get count of registered plugins across all kinds.
    pub fn plugin_count(&self) -> usize {
        self.importers.len() + self.processors.len() + self.exporters.len()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn insert<C>(
    table: &mut BTreeMap<String, C>,
    kind: PluginKind,
    name: String,
    ctor: C,
) -> Result<(), RegistryError> {
    if table.contains_key(&name) {
        return Err(RegistryError::Duplicate { kind, name });
    }
    table.insert(name, ctor);
    Ok(())
}

fn resolve<'a, C>(
    table: &'a BTreeMap<String, C>,
    kind: PluginKind,
    name: &str,
) -> Result<&'a C, RegistryError> {
    table.get(name).ok_or_else(|| RegistryError::NotFound {
        kind,
        name: name.to_string(),
    })
}

/// Build the plugin registry with all built-in plugins.
///
/// Add new plugin registrations here as they are implemented.
pub fn build_registry() -> Result<PluginRegistry, RegistryError> {
    let mut registry = PluginRegistry::new();

    registry.register_importer(file_reader::PLUGIN_NAME, || {
        Box::new(file_reader::FileReaderImporter::new())
    })?;

    registry.register_processor(noop_processor::PLUGIN_NAME, || {
        Box::new(noop_processor::NoopProcessor::new())
    })?;
    registry.register_processor(filter::PLUGIN_NAME, || {
        Box::new(filter::FilterProcessor::new())
    })?;

    registry.register_exporter(noop_exporter::PLUGIN_NAME, || {
        Box::new(noop_exporter::NoopExporter::new())
    })?;
    registry.register_exporter(file_writer::PLUGIN_NAME, || {
        Box::new(file_writer::FileWriterExporter::new())
    })?;

    tracing::info!(
        "Built plugin registry with {} plugins ({} importers, {} processors, {} exporters)",
        registry.plugin_count(),
        registry.importers.len(),
        registry.processors.len(),
        registry.exporters.len()
    );

    Ok(registry)
}
