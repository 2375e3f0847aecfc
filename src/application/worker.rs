//! Background job runner
//!
//! Runs a recovery job on its own thread so the caller never blocks on
//! device I/O. Progress and the final report come back over a channel.

use crate::application::cancellation::CancellationToken;
use crate::application::dto::{JobOutcome, JobReport, JobStats};
use crate::application::recovery_job::RecoveryJob;
use crate::domain::entities::{ProgressEvent, ScanPhase};
use crate::domain::repositories::VolumeReader;
use crossbeam_channel::{Receiver, TrySendError, bounded};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Messages sent from the worker to the caller
#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Finished(JobReport),
}

/// Caller's side of a running job
pub struct JobHandle {
    events: Receiver<JobEvent>,
    cancel: CancellationToken,
    thread: JoinHandle<JobReport>,
}

impl JobHandle {
    /// Progress events followed by one `Finished` event
    ///
    /// Intermediate progress is dropped rather than queued when the caller
    /// falls behind. The completion progress event and `Finished` are always
    /// delivered while the receiver is alive; the worker waits for room.
    /// The channel disconnects once the worker exits.
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Requests cooperative cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker and returns its report
    pub fn join(self) -> JobReport {
        let Self { events, thread, .. } = self;
        drop(events);
        thread.join().unwrap_or_else(|_| JobReport {
            outcome: JobOutcome::Failed {
                reason: "recovery worker panicked".to_string(),
            },
            output_dir: None,
            elapsed: Duration::ZERO,
            stats: JobStats::default(),
        })
    }
}

/// Starts `job` on a dedicated worker thread
pub fn spawn_job<V>(mut job: RecoveryJob<V>) -> io::Result<JobHandle>
where
    V: VolumeReader + 'static,
{
    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    let cancel = job.cancellation_token().clone();

    let thread = thread::Builder::new()
        .name("recovery-worker".to_string())
        .spawn(move || {
            let mut receiver_gone = false;
            let report = job.run(&mut |event| {
                if receiver_gone {
                    return;
                }
                let delivered = if event.phase == ScanPhase::Finished {
                    tx.send(JobEvent::Progress(event)).is_ok()
                } else {
                    !matches!(
                        tx.try_send(JobEvent::Progress(event)),
                        Err(TrySendError::Disconnected(_))
                    )
                };
                if !delivered {
                    debug!("progress receiver dropped");
                    receiver_gone = true;
                }
            });
            // Blocks until the caller reads it or drops the receiver.
            if !receiver_gone && tx.send(JobEvent::Finished(report.clone())).is_err() {
                debug!("completion receiver dropped");
            }
            report
        })?;

    Ok(JobHandle {
        events: rx,
        cancel,
        thread,
    })
}
