//! Round-by-round orchestration of importer, processors and exporter.
//!
//! One round is in flight at a time. Each round runs
//! fetch → process* → export → complete, and only then is the next round
//! persisted as the resume point. A failed round stops the run without moving
//! the resume point, so the next run retries the same round.

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{PipelineError, RoundError, Stage};
pub use orchestrator::{Pipeline, PipelineStatus};
pub use state::{FileStateStore, MemoryStateStore, PipelineState, StateError, StateStore, STATE_FILE_NAME};
