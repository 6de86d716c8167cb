//! Block-processing pipeline for ledger indexers.
//!
//! An importer produces one round at a time, configured processors transform
//! it in order and an exporter delivers it. Progress is persisted after every
//! round so that a restarted pipeline resumes where it stopped.

pub mod pipeline;
pub mod plugins;
pub mod shutdown;
pub mod types;
