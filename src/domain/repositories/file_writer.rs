//! File writer trait
//!
//! Defines the interface for materializing recovered files in the job's
//! output directory.

use crate::domain::entities::{CarveHit, RecoveredFileRecord};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when writing a recovered file
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Short write to {path}: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("No free destination name for {name}")]
    Exhausted { name: String },
}

impl WriteError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Something to recover: a live file or a carve hit
#[derive(Debug, Clone, Copy)]
pub enum RecoveryItem<'a> {
    /// A file still referenced by a directory, copied as-is
    File(&'a Path),
    /// Content captured from raw device bytes
    Carved(&'a CarveHit),
}

/// Trait for writing recovered files to storage
///
/// Writes are all-or-nothing: on error no file is left behind under the
/// destination name and the written count is unchanged.
///
/// # Example
///
/// ```ignore
/// let mut writer = LocalFileWriter::new(job_dir)?;
/// let record = writer.write(RecoveryItem::Carved(&hit))?;
/// println!("Saved to: {}", record.destination().display());
/// ```
pub trait RecoveredFileWriter {
    /// Writes one recovered item
    fn write(&mut self, item: RecoveryItem<'_>) -> Result<RecoveredFileRecord, WriteError>;

    /// Returns the output directory
    fn output_dir(&self) -> &Path;

    /// Returns the number of files written so far
    fn files_written(&self) -> u64;

    /// Returns the total bytes written so far
    fn bytes_written(&self) -> u64;
}
