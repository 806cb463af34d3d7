//! # stepseq-recorder
//!
//! Bounded-resource tick recording for stepseq.
//!
//! Samples are fixed-width binary records written through gzip into
//! timestamped files. Files rotate once they hold a configured number of
//! samples, and the oldest files are pruned so disk usage stays capped.
//!
//! This crate provides:
//! - Recorder configuration (YAML file + defaults)
//! - The versioned sample format and its reader
//! - The rotating, pruning recorder itself

pub mod config;
pub mod error;
pub mod recorder;
pub mod sample;

pub use config::RecorderConfig;
pub use error::RecorderError;
pub use recorder::Recorder;
pub use sample::{SampleReader, TickSample, INTERFACE_VERSION};
