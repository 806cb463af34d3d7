//! Recorder configuration.

use crate::error::RecorderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recorder configuration, loadable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Master switch; a disabled recorder accepts samples and drops them.
    pub enabled: bool,

    /// Directory holding the sample files. Created on open.
    pub directory: PathBuf,

    /// Samples per file before rotating to a new one.
    pub max_samples_per_file: u64,

    /// Number of files kept on disk; rotation prunes the oldest beyond
    /// this.
    pub max_file_count: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("work/recorder"),
            // One day of samples at a 100ms tick.
            max_samples_per_file: 864_000,
            max_file_count: 15,
        }
    }
}

impl RecorderConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RecorderConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = dir.into();
        self
    }
}
