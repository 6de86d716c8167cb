//! Persisted pipeline progress.
//!
//! Written once at startup and once after every completed round. The file
//! store writes through a temp file and a rename so that a crash never leaves
//! a half-written document behind.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::config::PipelineConfig;

/// Name of the state document inside a data directory.
pub const STATE_FILE_NAME: &str = "metadata.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// First round not yet completed.
    pub next_round: u64,

    /// Genesis hash of the network this state belongs to.
    #[serde(default)]
    pub genesis_hash: String,

    /// Configuration the last run was started with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PipelineConfig>,
}

pub trait StateStore: Send {
    /// `None` when nothing was persisted yet.
    fn load(&self) -> Result<Option<PipelineState>, StateError>;

    fn save(&mut self, state: &PipelineState) -> Result<(), StateError>;
}

/// `metadata.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<PipelineState>, StateError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, state: &PipelineState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a test can keep one clone
/// and inspect what the pipeline persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<Mutex<Option<PipelineState>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PipelineState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(state))),
        }
    }

    pub fn snapshot(&self) -> Option<PipelineState> {
        self.inner.lock().ok().and_then(|s| s.clone())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<PipelineState>, StateError> {
        Ok(self.snapshot())
    }

    fn save(&mut self, state: &PipelineState) -> Result<(), StateError> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "state lock poisoned"))?;
        *slot = Some(state.clone());
        Ok(())
    }
}
