//! Recovery job use case
//!
//! Runs the metadata phase and, when requested, the carving phase against
//! one volume, feeding everything found into a recovered-file writer.

use crate::application::cancellation::CancellationToken;
use crate::application::dto::{JobOutcome, JobReport, JobRequest, JobStats, ScanOptions};
use crate::application::error::JobError;
use crate::domain::entities::{CarveHit, ProgressEvent, ScanPhase};
use crate::domain::repositories::{
    RecoveredFileWriter, RecoveryItem, VolumeError, VolumeReader, WriteError,
};
use crate::domain::services::{CarveObserver, CarvingEngine, SignatureRegistry};
use crate::infrastructure::block_device::FileVolume;
use crate::infrastructure::file_systems::MetadataScanner;
use crate::infrastructure::persistence::{LocalFileWriter, create_job_dir};
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a job is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Scanning(ScanPhase),
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

/// One recovery job, run once
///
/// `V` is the volume reader used by the carving phase.
///
/// # Example
///
/// ```ignore
/// let request = JobRequest::new("/media/usb", selection, "/tmp/out").with_deep_scan(true);
/// let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default())?;
/// let report = job.run(&mut |event| println!("{}", event.message));
/// ```
pub struct RecoveryJob<V: VolumeReader = FileVolume> {
    request: JobRequest,
    options: ScanOptions,
    registry: &'static SignatureRegistry,
    cancel: CancellationToken,
    state: JobState,
    /// Set when a poll point saw the token
    cancel_observed: bool,
    recovered_count: u64,
    stats: JobStats,
    output_dir: Option<PathBuf>,
    _volume: PhantomData<fn() -> V>,
}

impl<V: VolumeReader> RecoveryJob<V> {
    /// Validates the request and creates a job in the `Created` state
    pub fn new(request: JobRequest, options: ScanOptions) -> Result<Self, JobError> {
        if request.selection.is_empty() {
            return Err(JobError::Validation(
                "at least one file type must be selected".to_string(),
            ));
        }
        if request.volume_id.trim().is_empty() {
            return Err(JobError::Validation("no volume given".to_string()));
        }
        if request.output_dir.as_os_str().is_empty() {
            return Err(JobError::Validation("no output directory given".to_string()));
        }
        options.validate()?;

        Ok(Self {
            request,
            options,
            registry: SignatureRegistry::global(),
            cancel: CancellationToken::new(),
            state: JobState::Created,
            cancel_observed: false,
            recovered_count: 0,
            stats: JobStats::default(),
            output_dir: None,
            _volume: PhantomData,
        })
    }

    /// Uses a caller-owned token instead of the job's own
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Files successfully written so far across both phases
    pub fn recovered_count(&self) -> u64 {
        self.recovered_count
    }

    pub fn request(&self) -> &JobRequest {
        &self.request
    }

    /// Runs the job, writing into a fresh directory under the request's output dir
    pub fn run(&mut self, progress: &mut dyn FnMut(ProgressEvent)) -> JobReport {
        let started = Instant::now();
        let result = self.begin().and_then(|()| {
            let mut writer = self.open_output()?;
            self.run_phases(&mut writer, &mut *progress)
        });
        self.finish(result, started, progress)
    }

    /// Runs the job against a caller-supplied writer
    pub fn run_with_writer<W>(
        &mut self,
        writer: &mut W,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> JobReport
    where
        W: RecoveredFileWriter + ?Sized,
    {
        let started = Instant::now();
        let result = self
            .begin()
            .and_then(|()| self.run_phases(&mut *writer, &mut *progress));
        self.finish(result, started, progress)
    }

    /// Checks the job is fresh and its volume exists
    fn begin(&mut self) -> Result<(), JobError> {
        if self.state != JobState::Created {
            return Err(JobError::Validation("job has already run".to_string()));
        }
        fs::metadata(&self.request.volume_id).map_err(|source| VolumeError::Access {
            volume: self.request.volume_id.clone(),
            source,
        })?;
        Ok(())
    }

    fn open_output(&mut self) -> Result<LocalFileWriter, JobError> {
        let base = &self.request.output_dir;
        let job_dir = create_job_dir(base, self.options.timestamp_dir).map_err(|source| {
            JobError::OutputDir {
                path: base.clone(),
                source,
            }
        })?;
        LocalFileWriter::new(&job_dir).map_err(|e| match e {
            WriteError::Io { path, source } => JobError::OutputDir { path, source },
            other => JobError::OutputDir {
                path: job_dir.clone(),
                source: std::io::Error::other(other),
            },
        })
    }

    fn run_phases<W>(
        &mut self,
        writer: &mut W,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<(), JobError>
    where
        W: RecoveredFileWriter + ?Sized,
    {
        self.output_dir = Some(writer.output_dir().to_path_buf());

        self.metadata_phase(writer, progress);
        if self.cancel_observed || !self.request.deep_scan {
            return Ok(());
        }
        if self.cancel.is_cancelled() {
            debug!("cancelled before carving");
            self.cancel_observed = true;
            return Ok(());
        }
        self.carving_phase(writer, progress)
    }

    fn metadata_phase<W>(&mut self, writer: &mut W, progress: &mut dyn FnMut(ProgressEvent))
    where
        W: RecoveredFileWriter + ?Sized,
    {
        self.state = JobState::Scanning(ScanPhase::Metadata);
        debug!(volume = %self.request.volume_id, "metadata phase started");
        progress(ProgressEvent::new(
            ScanPhase::Metadata,
            0,
            0,
            format!("Scanning files in {}", self.request.volume_id),
        ));

        let scanner =
            MetadataScanner::new(&self.request.volume_id, self.request.selection.clone())
                .exclude(writer.output_dir())
                .follow_links(self.options.follow_links);
        let every = self.options.progress_every_entries.max(1);

        for entry in scanner.entries() {
            self.stats.entries_examined += 1;

            if entry.is_selected() {
                match writer.write(RecoveryItem::File(&entry.path)) {
                    Ok(_) => {
                        self.recovered_count += 1;
                        self.stats.metadata_recovered += 1;
                    }
                    Err(e) => {
                        self.stats.write_failures += 1;
                        warn!(path = %entry.path.display(), error = %e, "failed to recover file");
                    }
                }
            }

            if self.stats.entries_examined % every == 0 {
                progress(ProgressEvent::new(
                    ScanPhase::Metadata,
                    self.stats.entries_examined,
                    0,
                    format!("{} files recovered", self.recovered_count),
                ));
            }

            if self.cancel.is_cancelled() {
                debug!("metadata phase cancelled");
                self.cancel_observed = true;
                break;
            }
        }

        progress(ProgressEvent::new(
            ScanPhase::Metadata,
            self.stats.entries_examined,
            self.stats.entries_examined,
            format!(
                "Recovered {} files from {} entries",
                self.stats.metadata_recovered, self.stats.entries_examined
            ),
        ));
    }

    fn carving_phase<W>(
        &mut self,
        writer: &mut W,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<(), JobError>
    where
        W: RecoveredFileWriter + ?Sized,
    {
        self.state = JobState::Scanning(ScanPhase::Carving);
        let device = self.request.carve_device();
        debug!(device = %device, "carving phase started");
        progress(ProgressEvent::new(
            ScanPhase::Carving,
            0,
            0,
            format!("Scanning raw bytes of {}", device),
        ));

        let mut volume = V::open(&device)?;
        let engine = CarvingEngine::new(self.registry, self.options.chunk_size);
        let mut sink = CarveSink {
            writer,
            cancel: &self.cancel,
            progress,
            recovered_before: self.recovered_count,
            recovered: 0,
            write_failures: 0,
        };

        let result = engine.carve(&mut volume, &self.request.selection, &mut sink);
        let (recovered, write_failures) = (sink.recovered, sink.write_failures);
        volume.close();

        self.recovered_count += recovered;
        self.stats.carved_recovered += recovered;
        self.stats.write_failures += write_failures;

        let summary = result?;
        self.cancel_observed |= summary.cancelled;
        self.stats.total_bytes = summary.total_bytes;
        self.stats.bytes_scanned = summary.bytes_scanned;
        self.stats.chunks_read = summary.chunks_read;
        self.stats.read_errors = summary.read_errors;
        self.stats.carve_hits = summary.hits;
        Ok(())
    }

    fn finish(
        &mut self,
        result: Result<(), JobError>,
        started: Instant,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> JobReport {
        let already_finished = self.state.is_terminal();
        let outcome = match result {
            Ok(()) if self.cancel_observed => {
                self.state = JobState::Cancelled;
                JobOutcome::Cancelled {
                    recovered_count: self.recovered_count,
                }
            }
            Ok(()) => {
                self.state = JobState::Completed;
                JobOutcome::Completed {
                    recovered_count: self.recovered_count,
                }
            }
            Err(e) => {
                error!(volume = %self.request.volume_id, error = %e, "recovery job failed");
                if !already_finished {
                    self.state = JobState::Failed;
                }
                JobOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            outcome = %outcome,
            recovered = self.recovered_count,
            write_failures = self.stats.write_failures,
            "recovery job finished"
        );
        progress(ProgressEvent::new(
            ScanPhase::Finished,
            self.recovered_count,
            self.recovered_count,
            outcome.to_string(),
        ));

        JobReport {
            outcome,
            output_dir: self.output_dir.clone(),
            elapsed: started.elapsed(),
            stats: self.stats.clone(),
        }
    }
}

/// Feeds carve hits into the writer and forwards carving progress
struct CarveSink<'a, W: ?Sized> {
    writer: &'a mut W,
    cancel: &'a CancellationToken,
    progress: &'a mut dyn FnMut(ProgressEvent),
    recovered_before: u64,
    recovered: u64,
    write_failures: u64,
}

impl<W: RecoveredFileWriter + ?Sized> CarveObserver for CarveSink<'_, W> {
    fn on_hit(&mut self, hit: CarveHit) {
        match self.writer.write(RecoveryItem::Carved(&hit)) {
            Ok(_) => self.recovered += 1,
            Err(e) => {
                self.write_failures += 1;
                warn!(
                    offset = hit.offset(),
                    extension = hit.extension(),
                    error = %e,
                    "failed to write carved file"
                );
            }
        }
    }

    fn on_progress(&mut self, processed: u64, total: u64) {
        (self.progress)(ProgressEvent::new(
            ScanPhase::Carving,
            processed,
            total,
            format!(
                "{} files recovered",
                self.recovered_before + self.recovered
            ),
        ));
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
