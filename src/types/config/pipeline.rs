use std::path::Path;

use anyhow::Context;
use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Name of the configuration document inside a data directory.
pub const CONFIG_FILE_NAME: &str = "pipeline.json";

/// One configured plugin: registry name plus an opaque configuration
/// document the plugin deserializes itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl PluginConfig {
    pub fn new(name: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Plugin with no configuration.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, serde_json::Value::Null)
    }

    /// Deserialize the plugin's typed configuration. A missing document
    /// deserializes as an empty object so that all-default configs work.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.config {
            serde_json::Value::Null => serde_json::from_value(serde_json::json!({})),
            value => serde_json::from_value(value.clone()),
        }
    }
}

/// Immutable-after-load pipeline description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Start at this round regardless of persisted progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_round_override: Option<u64>,

    pub importer: PluginConfig,

    /// Applied strictly in listed order.
    #[serde(default)]
    pub processors: Vec<PluginConfig>,

    pub exporter: PluginConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PipelineConfig {
    pub fn new(importer: PluginConfig, processors: Vec<PluginConfig>, exporter: PluginConfig) -> Self {
        Self {
            log_level: default_log_level(),
            next_round_override: None,
            importer,
            processors,
            exporter,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        // Plugin configs are held as `serde_json::Value`, which keeps only the
        // last of repeated keys.
        serde_json::from_str::<UniqueKeys>(content)?;
        let config: PipelineConfig = serde_json::from_str(content)?;
        anyhow::ensure!(!config.importer.name.is_empty(), "importer name is empty");
        anyhow::ensure!(!config.exporter.name.is_empty(), "exporter name is empty");
        Ok(config)
    }
}

/// Walks any JSON document and fails on an object that repeats a key.
struct UniqueKeys;

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = UniqueKeys;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(UniqueKeys)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<UniqueKeys>()?.is_some() {}
        Ok(UniqueKeys)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut seen = std::collections::HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate key '{}'", key)));
            }
            map.next_value::<UniqueKeys>()?;
        }
        Ok(UniqueKeys)
    }
}
