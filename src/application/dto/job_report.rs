//! Job report DTO

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal result of a recovery job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed { recovered_count: u64 },
    Cancelled { recovered_count: u64 },
    Failed { reason: String },
}

impl JobOutcome {
    /// Files recovered, or None for a failed job
    pub fn recovered_count(&self) -> Option<u64> {
        match self {
            JobOutcome::Completed { recovered_count }
            | JobOutcome::Cancelled { recovered_count } => Some(*recovered_count),
            JobOutcome::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Completed { recovered_count } => {
                write!(f, "Recovery completed: {} files recovered", recovered_count)
            }
            JobOutcome::Cancelled { recovered_count } => {
                write!(f, "Recovery cancelled: {} files recovered", recovered_count)
            }
            JobOutcome::Failed { reason } => write!(f, "Recovery failed: {}", reason),
        }
    }
}

/// Counters collected while a job runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub entries_examined: u64,
    pub metadata_recovered: u64,
    pub total_bytes: u64,
    pub bytes_scanned: u64,
    pub chunks_read: u64,
    pub read_errors: u64,
    pub carve_hits: u64,
    pub carved_recovered: u64,
    pub write_failures: u64,
}

/// Everything reported once a job reaches a terminal state
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub outcome: JobOutcome,
    /// The job's own directory, once it was created
    pub output_dir: Option<PathBuf>,
    pub elapsed: Duration,
    pub stats: JobStats,
}

impl JobReport {
    /// Returns a multi-line summary for terminal output
    pub fn summary(&self) -> String {
        let mut summary = format!("{}\n", self.outcome);
        if let Some(dir) = &self.output_dir {
            summary.push_str(&format!("Output: {}\n", dir.display()));
        }
        summary.push_str(&format!(
            "  - live files: {} of {} entries\n",
            self.stats.metadata_recovered, self.stats.entries_examined
        ));
        if self.stats.chunks_read > 0 || self.stats.read_errors > 0 {
            summary.push_str(&format!(
                "  - carved: {} of {} signatures ({} read errors)\n",
                self.stats.carved_recovered, self.stats.carve_hits, self.stats.read_errors
            ));
        }
        if self.stats.write_failures > 0 {
            summary.push_str(&format!(
                "  - {} files could not be written\n",
                self.stats.write_failures
            ));
        }
        summary.push_str(&format!("Elapsed: {:.2}s\n", self.elapsed.as_secs_f64()));
        summary
    }
}
