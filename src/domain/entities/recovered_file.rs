//! Recovered file entity
//!
//! Bookkeeping for a file that was successfully written to the output
//! directory.

use super::file_signature::FileType;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a recovered file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySource {
    /// Copied from a file still referenced by a live directory
    Metadata { path: PathBuf },
    /// Carved from raw device bytes
    Carved { offset: u64, file_type: FileType },
}

impl fmt::Display for RecoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverySource::Metadata { path } => write!(f, "{}", path.display()),
            RecoverySource::Carved { offset, file_type } => {
                write!(f, "offset {} ({})", offset, file_type)
            }
        }
    }
}

/// Write-once record of a successful recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFileRecord {
    source: RecoverySource,
    destination: PathBuf,
    size: u64,
}

impl RecoveredFileRecord {
    pub fn new(source: RecoverySource, destination: PathBuf, size: u64) -> Self {
        Self {
            source,
            destination,
            size,
        }
    }

    pub fn source(&self) -> &RecoverySource {
        &self.source
    }

    /// Path of the recovered file inside the job's output directory
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Bytes written
    pub fn size(&self) -> u64 {
        self.size
    }
}
