//! Application layer tests
//!
//! End-to-end recovery jobs over temporary directory trees and disk images.

use reclaim::application::dto::{JobOutcome, JobRequest, ScanOptions};
use reclaim::application::{
    CancellationToken, JobError, JobEvent, JobState, RecoveryJob, spawn_job,
};
use reclaim::domain::entities::{
    FileTypeSelection, ProgressEvent, RecoveredFileRecord, ScanPhase,
};
use reclaim::domain::repositories::{
    RecoveredFileWriter, RecoveryItem, VolumeError, VolumeReader, WriteError,
};
use reclaim::infrastructure::persistence::LocalFileWriter;
use rstest::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn disk_image(dir: &Path, len: usize, placements: &[(usize, &[u8])]) -> PathBuf {
    let mut data = vec![0u8; len];
    for (offset, magic) in placements {
        data[*offset..*offset + magic.len()].copy_from_slice(magic);
    }
    let path = dir.join("disk.img");
    fs::write(&path, data).unwrap();
    path
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn ignore(_: ProgressEvent) {}

/// A mounted-volume stand-in with a few documents and images
#[fixture]
fn volume_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("docs/old")).unwrap();
    fs::write(root.join("docs/report.pdf"), b"%PDF-1.4 report").unwrap();
    fs::write(root.join("docs/old/report.pdf"), b"%PDF-1.3 old").unwrap();
    fs::write(root.join("photo.JPG"), b"\xFF\xD8\xFF\xE0 jpeg").unwrap();
    fs::write(root.join("notes.txt"), b"not selected").unwrap();
    fs::write(root.join("song.mp3"), b"ID3 not selected").unwrap();
    dir
}

fn selection() -> FileTypeSelection {
    FileTypeSelection::new([".pdf", ".jpg", ".png"])
}

// ============================================================================
// Validation
// ============================================================================

#[rstest]
fn test_empty_selection_rejected() {
    let request = JobRequest::new("/mnt", FileTypeSelection::default(), "/tmp/out");
    let result: Result<RecoveryJob, _> = RecoveryJob::new(request, ScanOptions::default());
    assert!(matches!(result, Err(JobError::Validation(_))));
}

#[rstest]
#[case("", "/tmp/out", ScanOptions::default())]
#[case("/mnt", "", ScanOptions::default())]
#[case("/mnt", "/tmp/out", ScanOptions::default().with_chunk_size(0))]
fn test_invalid_requests(#[case] volume: &str, #[case] output: &str, #[case] options: ScanOptions) {
    let request = JobRequest::new(volume, selection(), output);
    let result: Result<RecoveryJob, _> = RecoveryJob::new(request, options);
    assert!(matches!(result, Err(JobError::Validation(_))));
}

// ============================================================================
// Metadata phase
// ============================================================================

#[rstest]
fn test_metadata_phase_copies_selected_files(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 3 });
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(report.stats.entries_examined, 5);
    assert_eq!(report.stats.metadata_recovered, 3);

    let job_dir = report.output_dir.unwrap();
    assert!(job_dir.starts_with(out.path()));
    assert!(
        job_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("recovered_files_")
    );
    assert_eq!(
        files_in(&job_dir),
        vec!["recovered_photo.JPG", "recovered_report.pdf", "recovered_report_1.pdf"]
    );
    // The walk is sorted, so docs/old is visited before docs/report.pdf.
    assert_eq!(
        fs::read(job_dir.join("recovered_report.pdf")).unwrap(),
        b"%PDF-1.3 old"
    );
}

#[rstest]
fn test_output_inside_volume_is_not_rescanned(volume_tree: TempDir) {
    let base = volume_tree.path().join("rescued");
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), &base);
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 3 });
    assert_eq!(files_in(&report.output_dir.unwrap()).len(), 3);
}

#[rstest]
fn test_progress_events(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let options = ScanOptions {
        progress_every_entries: 2,
        ..ScanOptions::default()
    };
    let mut job: RecoveryJob = RecoveryJob::new(request, options).unwrap();

    let mut events = Vec::new();
    job.run(&mut |event| events.push(event));

    assert_eq!(events.first().unwrap().phase, ScanPhase::Metadata);
    let batches = events
        .iter()
        .filter(|e| e.phase == ScanPhase::Metadata && e.total == 0 && e.processed > 0)
        .count();
    assert_eq!(batches, 2);

    let last = events.last().unwrap();
    assert_eq!(last.phase, ScanPhase::Finished);
    assert_eq!(last.processed, 3);
    assert!(last.message.contains("3 files recovered"));
}

/// Writer that fails every other call
struct FlakyWriter {
    inner: LocalFileWriter,
    calls: u64,
}

impl RecoveredFileWriter for FlakyWriter {
    fn write(&mut self, item: RecoveryItem<'_>) -> Result<RecoveredFileRecord, WriteError> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(WriteError::Exhausted {
                name: "flaky".to_string(),
            });
        }
        self.inner.write(item)
    }

    fn output_dir(&self) -> &Path {
        self.inner.output_dir()
    }

    fn files_written(&self) -> u64 {
        self.inner.files_written()
    }

    fn bytes_written(&self) -> u64 {
        self.inner.bytes_written()
    }
}

#[rstest]
fn test_count_equals_successful_writes(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let image = disk_image(
        images.path(),
        300_000,
        &[(1_000, PNG_MAGIC), (100_000, PNG_MAGIC), (200_000, PNG_MAGIC)],
    );

    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path())
        .with_deep_scan(true)
        .with_raw_device(image.to_str().unwrap());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();
    let mut writer = FlakyWriter {
        inner: LocalFileWriter::new(out.path()).unwrap(),
        calls: 0,
    };

    let report = job.run_with_writer(&mut writer, &mut ignore);

    // 3 live files + 3 carved, every other write fails.
    assert_eq!(writer.calls, 6);
    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 3 });
    assert_eq!(job.recovered_count(), writer.files_written());
    assert_eq!(report.stats.write_failures, 3);
    assert_eq!(files_in(out.path()).len(), 3);
}

// ============================================================================
// Carving phase
// ============================================================================

#[rstest]
fn test_carving_image_example() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(
        images.path(),
        200_000,
        &[(65_530, PNG_MAGIC), (150_000, PNG_MAGIC)],
    );

    let request = JobRequest::new(
        image.to_str().unwrap(),
        FileTypeSelection::new([".png"]),
        out.path(),
    )
    .with_deep_scan(true);
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 2 });
    assert_eq!(report.stats.entries_examined, 0);
    assert_eq!(report.stats.carve_hits, 2);
    assert_eq!(report.stats.bytes_scanned, 200_000);

    let job_dir = report.output_dir.unwrap();
    let names = files_in(&job_dir);
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("recovered_file_150000_"));
    assert!(names[1].starts_with("recovered_file_65530_"));
    assert!(names.iter().all(|n| n.ends_with(".png")));

    let first = fs::read(job_dir.join(&names[1])).unwrap();
    assert_eq!(first.len(), 65_536);
    assert!(first.starts_with(PNG_MAGIC));
}

#[rstest]
fn test_without_deep_scan_image_is_not_carved() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(images.path(), 10_000, &[(0, PNG_MAGIC)]);

    let request = JobRequest::new(image.to_str().unwrap(), FileTypeSelection::new([".png"]), out.path());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);
    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 0 });
    assert_eq!(report.stats.chunks_read, 0);
}

#[rstest]
fn test_cancel_mid_carve() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(
        images.path(),
        400_000,
        &[(1_000, PNG_MAGIC), (300_000, PNG_MAGIC)],
    );

    let request = JobRequest::new(image.to_str().unwrap(), FileTypeSelection::new([".png"]), out.path())
        .with_deep_scan(true);
    let token = CancellationToken::new();
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default())
        .unwrap()
        .with_cancellation(token.clone());

    let report = job.run(&mut |event| {
        if event.phase == ScanPhase::Carving && event.processed > 0 {
            token.cancel();
        }
    });

    assert_eq!(report.outcome, JobOutcome::Cancelled { recovered_count: 1 });
    assert_eq!(job.state(), JobState::Cancelled);
    assert_eq!(report.stats.chunks_read, 1);
    assert_eq!(files_in(&report.output_dir.unwrap()).len(), 1);
}

#[rstest]
fn test_cancel_after_metadata_walk_still_completes(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let token = CancellationToken::new();
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default())
        .unwrap()
        .with_cancellation(token.clone());

    // The phase summary is emitted after the last entry was polled.
    let report = job.run(&mut |event| {
        if event.phase == ScanPhase::Metadata && event.total > 0 && event.processed == event.total {
            token.cancel();
        }
    });

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 3 });
    assert_eq!(job.state(), JobState::Completed);
}

#[rstest]
fn test_cancel_after_last_chunk_still_completes() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(
        images.path(),
        200_000,
        &[(65_530, PNG_MAGIC), (150_000, PNG_MAGIC)],
    );

    let request = JobRequest::new(image.to_str().unwrap(), FileTypeSelection::new([".png"]), out.path())
        .with_deep_scan(true);
    let token = CancellationToken::new();
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default())
        .unwrap()
        .with_cancellation(token.clone());

    let report = job.run(&mut |event| {
        if event.phase == ScanPhase::Carving && event.total > 0 && event.processed == event.total {
            token.cancel();
        }
    });

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 2 });
    assert_eq!(report.stats.bytes_scanned, 200_000);
}

/// Volume whose length cannot be determined
struct SizelessVolume(String);

impl VolumeReader for SizelessVolume {
    fn open(volume_id: &str) -> Result<Self, VolumeError> {
        Ok(Self(volume_id.to_string()))
    }

    fn id(&self) -> &str {
        &self.0
    }

    fn size(&self) -> Result<u64, VolumeError> {
        Err(VolumeError::SizeUnknown {
            volume: self.0.clone(),
            reason: "no length".to_string(),
        })
    }

    fn read_chunk(&mut self, _offset: u64, _length: usize) -> Result<Vec<u8>, VolumeError> {
        Ok(Vec::new())
    }
}

#[rstest]
fn test_size_unknown_fails_after_metadata(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path())
        .with_deep_scan(true)
        .with_raw_device("sizeless");
    let mut job = RecoveryJob::<SizelessVolume>::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);

    let JobOutcome::Failed { reason } = &report.outcome else {
        panic!("expected failure, got {:?}", report.outcome);
    };
    assert!(reason.contains("size"));
    assert_eq!(job.state(), JobState::Failed);
    // Files from the metadata phase stay on disk.
    assert_eq!(files_in(&report.output_dir.unwrap()).len(), 3);
}

#[rstest]
fn test_unopenable_raw_device_fails(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path())
        .with_deep_scan(true)
        .with_raw_device("/no/such/device");
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);
    assert!(matches!(report.outcome, JobOutcome::Failed { .. }));
    assert_eq!(report.stats.metadata_recovered, 3);
}

// ============================================================================
// Setup failures
// ============================================================================

#[rstest]
fn test_missing_volume_fails_before_any_phase() {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new("/no/such/volume", selection(), out.path());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let mut events = Vec::new();
    let report = job.run(&mut |event| events.push(event));

    assert!(matches!(report.outcome, JobOutcome::Failed { .. }));
    assert!(report.output_dir.is_none());
    assert!(files_in(out.path()).is_empty());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].phase, ScanPhase::Finished);
}

#[rstest]
fn test_output_dir_blocked_by_file(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("taken");
    fs::write(&blocker, b"file").unwrap();

    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), &blocker);
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let report = job.run(&mut ignore);
    let JobOutcome::Failed { reason } = report.outcome else {
        panic!("expected failure");
    };
    assert!(reason.contains("output directory"));
}

#[rstest]
fn test_job_runs_once(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    job.run(&mut ignore);
    let again = job.run(&mut ignore);

    assert!(matches!(again.outcome, JobOutcome::Failed { .. }));
    assert_eq!(job.state(), JobState::Completed);
}

// ============================================================================
// Worker
// ============================================================================

#[rstest]
fn test_worker_reports_over_channel(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();

    let handle = spawn_job(job).unwrap();
    let events: Vec<JobEvent> = handle.events().iter().collect();
    let report = handle.join();

    assert!(matches!(events.first(), Some(JobEvent::Progress(_))));
    let Some(JobEvent::Finished(finished)) = events.last() else {
        panic!("last event should be Finished");
    };
    assert_eq!(finished.outcome, report.outcome);
    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 3 });
}

#[rstest]
fn test_worker_delivers_completion_to_slow_reader() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(images.path(), 2_000_000, &[]);

    let request = JobRequest::new(image.to_str().unwrap(), FileTypeSelection::new([".png"]), out.path())
        .with_deep_scan(true);
    let job: RecoveryJob =
        RecoveryJob::new(request, ScanOptions::default().with_chunk_size(512)).unwrap();

    let handle = spawn_job(job).unwrap();
    // Let the channel fill up before reading anything.
    while !handle.events().is_full() && !handle.is_finished() {
        thread::sleep(Duration::from_millis(1));
    }

    let events: Vec<JobEvent> = handle.events().iter().collect();
    let report = handle.join();

    assert_eq!(report.outcome, JobOutcome::Completed { recovered_count: 0 });
    let [.., JobEvent::Progress(completion), JobEvent::Finished(finished)] = events.as_slice() else {
        panic!("completion events missing from {} events", events.len());
    };
    assert_eq!(completion.phase, ScanPhase::Finished);
    assert_eq!(finished.outcome, report.outcome);
}

#[rstest]
fn test_worker_cancelled_before_start() {
    let images = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let image = disk_image(images.path(), 100_000, &[(10, PNG_MAGIC)]);

    let request = JobRequest::new(image.to_str().unwrap(), FileTypeSelection::new([".png"]), out.path())
        .with_deep_scan(true);
    let job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();
    job.cancellation_token().cancel();

    let handle = spawn_job(job).unwrap();
    let report = handle.join();

    assert_eq!(report.outcome, JobOutcome::Cancelled { recovered_count: 0 });
    assert_eq!(report.stats.chunks_read, 0);
}

// ============================================================================
// Report
// ============================================================================

#[rstest]
fn test_report_serializes_with_status_tag(volume_tree: TempDir) {
    let out = TempDir::new().unwrap();
    let request = JobRequest::new(volume_tree.path().to_str().unwrap(), selection(), out.path());
    let mut job: RecoveryJob = RecoveryJob::new(request, ScanOptions::default()).unwrap();
    let report = job.run(&mut ignore);

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"]["status"], "completed");
    assert_eq!(json["outcome"]["recovered_count"], 3);
    assert_eq!(json["stats"]["metadata_recovered"], 3);
    assert!(report.summary().contains("3 files recovered"));
}
