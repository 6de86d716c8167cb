//! Filter processor: drops transactions that fail configured match rules.
//!
//! Configuration is an ordered list of groups. Each group has exactly one
//! operation key (`any` or `all`) holding its searchers:
//!
//! ```json
//! {
//!   "search-inner": false,
//!   "filters": [
//!     {"any": [
//!       {"tag": "txn.type", "expression-type": "exact", "expression": "pay"},
//!       {"tag": "txn.type", "expression-type": "exact", "expression": "axfer"}
//!     ]},
//!     {"all": [
//!       {"tag": "txn.amt", "expression-type": "greater-than", "expression": 1000}
//!     ]}
//!   ]
//! }
//! ```
//!
//! A transaction is kept when every group is satisfied; all other
//! transactions are removed from the payset. Retained transactions keep their
//! relative order.

pub mod error;
pub mod expression;
pub mod fields;
pub mod searcher;

use std::fmt;

use async_trait::async_trait;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use error::FilterError;
pub use expression::{Expression, ExpressionType};
pub use fields::{resolve_field, FieldKind, FieldValue, TxnField};
pub use searcher::{FilterGroup, Operation, Searcher};

use crate::plugins::error::PluginError;
use crate::plugins::traits::{InitProvider, PluginMetadata, Processor};
use crate::shutdown::Shutdown;
use crate::types::config::PluginConfig;
use crate::types::data::{BlockData, SignedTxnWithAD};

pub const PLUGIN_NAME: &str = "filter_processor";

const SAMPLE_CONFIG: &str = r#"{
  "search-inner": false,
  "filters": [
    {"any": [
      {"tag": "txn.type", "expression-type": "exact", "expression": "pay"},
      {"tag": "txn.type", "expression-type": "exact", "expression": "axfer"}
    ]}
  ]
}"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Default for searchers that do not set `search-inner` themselves.
    #[serde(default)]
    pub search_inner: bool,

    /// Each entry must hold exactly one key, `any` or `all`.
    #[serde(default)]
    pub filters: Vec<GroupConfig>,
}

/// One `{"<operation>": [searchers]}` object. Every key is kept in document
/// order, duplicates included, so that compilation can reject anything other
/// than a single key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupConfig {
    entries: Vec<(String, Vec<SearcherConfig>)>,
}

impl GroupConfig {
    pub fn new(operation: impl Into<String>, searchers: Vec<SearcherConfig>) -> Self {
        Self {
            entries: vec![(operation.into(), searchers)],
        }
    }

    pub fn entries(&self) -> &[(String, Vec<SearcherConfig>)] {
        &self.entries
    }
}

impl Serialize for GroupConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (operation, searchers) in &self.entries {
            map.serialize_entry(operation, searchers)?;
        }
        map.end()
    }
}

struct GroupConfigVisitor;

impl<'de> Visitor<'de> for GroupConfigVisitor {
    type Value = GroupConfig;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with one operation key")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = access.next_entry::<String, Vec<SearcherConfig>>()? {
            entries.push(entry);
        }
        Ok(GroupConfig { entries })
    }
}

impl<'de> Deserialize<'de> for GroupConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(GroupConfigVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearcherConfig {
    #[serde(alias = "field")]
    pub tag: String,
    pub expression_type: String,
    pub expression: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_inner: Option<bool>,
}

/// Compile a filter configuration into groups.
pub fn compile_filters(config: &FilterConfig) -> Result<Vec<FilterGroup>, FilterError> {
    let mut groups = Vec::with_capacity(config.filters.len());

    for group_config in &config.filters {
        // A list of single-key maps rather than one map keeps the groups ordered.
        let entries = group_config.entries();
        if entries.len() != 1 {
            return Err(FilterError::InvalidGroupShape(entries.len()));
        }

        for (key, searcher_configs) in entries {
            let op: Operation = key.parse()?;

            let mut searchers = Vec::with_capacity(searcher_configs.len());
            for sc in searcher_configs {
                let field = resolve_field(&sc.tag)?;
                let expression_type: ExpressionType = sc.expression_type.parse()?;
                let expression =
                    Expression::compile(expression_type, &sc.expression, field.kind(), &sc.tag)?;
                let search_inner = sc.search_inner.unwrap_or(config.search_inner);
                searchers.push(Searcher::new(field, sc.tag.clone(), expression, search_inner));
            }

            groups.push(FilterGroup::new(op, searchers)?);
        }
    }

    Ok(groups)
}

/// Filters transactions by a variety of means.
#[derive(Debug, Default)]
pub struct FilterProcessor {
    cfg: FilterConfig,
    groups: Vec<FilterGroup>,
}

impl FilterProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn keep(&self, stxn: &SignedTxnWithAD) -> Result<bool, FilterError> {
        for group in &self.groups {
            if !group.matches(stxn)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Processor for FilterProcessor {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME,
            description: "Filter transactions out of the results according to a configurable pattern.",
            deprecated: false,
            sample_config: SAMPLE_CONFIG,
        }
    }

    fn config(&self) -> String {
        serde_json::to_string(&self.cfg).unwrap_or_default()
    }

    async fn init(
        &mut self,
        _shutdown: Shutdown,
        _provider: &InitProvider,
        config: &PluginConfig,
    ) -> Result<(), PluginError> {
        self.cfg = config
            .unmarshal()
            .map_err(|e| PluginError::config(PLUGIN_NAME, e.to_string()))?;
        self.groups = compile_filters(&self.cfg)?;

        tracing::info!(
            "Filter processor compiled {} group(s) with {} searcher(s)",
            self.groups.len(),
            self.groups.iter().map(|g| g.searchers().len()).sum::<usize>()
        );
        Ok(())
    }

    async fn process(&mut self, mut block: BlockData) -> Result<BlockData, PluginError> {
        let payset = std::mem::take(&mut block.payset);
        let before = payset.len();

        let mut kept = Vec::with_capacity(before);
        for stxn in payset {
            if self.keep(&stxn.signed)? {
                kept.push(stxn);
            }
        }

        tracing::debug!(
            "Round {}: filter kept {} of {} transactions",
            block.round(),
            kept.len(),
            before
        );

        block.payset = kept;
        Ok(block)
    }

    async fn close(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
