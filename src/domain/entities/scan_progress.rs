//! Scan progress entity
//!
//! Progress events flowing from the scanners up to whoever drives a job.

use serde::Serialize;
use std::fmt;

/// The phase a recovery job is in when it reports progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanPhase {
    /// Walking the live directory tree
    Metadata,
    /// Reading raw device bytes for signatures
    Carving,
    /// Terminal summary
    Finished,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::Metadata => f.write_str("metadata"),
            ScanPhase::Carving => f.write_str("carving"),
            ScanPhase::Finished => f.write_str("finished"),
        }
    }
}

/// A progress update: `processed` out of `total` units plus a message
///
/// Units are entries during the metadata phase (where `total` is unknown
/// and reported as 0) and bytes during carving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: ScanPhase,
    pub processed: u64,
    pub total: u64,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(phase: ScanPhase, processed: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            phase,
            processed,
            total,
            message: message.into(),
        }
    }

    /// Returns the progress percentage (0 - 100), or None when the total is unknown
    pub fn percentage(&self) -> Option<u64> {
        if self.total == 0 {
            return None;
        }
        Some((self.processed.min(self.total) as u128 * 100 / self.total as u128) as u64)
    }
}
