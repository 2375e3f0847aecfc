//! Scan options DTO

use crate::application::error::JobError;
use crate::domain::services::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine tunables for a recovery job
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```toml
/// chunk_size = 131072
/// follow_links = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
    /// Carving chunk size, also the length of every carved payload
    pub chunk_size: usize,
    /// Emit a metadata-phase progress event every this many entries
    pub progress_every_entries: u64,
    /// Follow symlinked directories during the metadata walk
    pub follow_links: bool,
    /// Name the job directory `recovered_files_<unix>`
    pub timestamp_dir: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_every_entries: 256,
            follow_links: false,
            timestamp_dir: true,
        }
    }
}

impl ScanOptions {
    /// Loads options from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, JobError> {
        let config_error = |message: String| JobError::Config {
            path: path.to_path_buf(),
            message,
        };

        let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let options: Self = toml::from_str(&text).map_err(|e| config_error(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Sets the chunk size
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.chunk_size == 0 {
            return Err(JobError::Validation(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
