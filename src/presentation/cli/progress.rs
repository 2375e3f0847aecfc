//! Progress reporting for CLI

use crate::domain::entities::{ProgressEvent, ScanPhase};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter using indicatif
///
/// A spinner counts entries during the metadata phase; a byte bar takes
/// over once carving reports the device size.
pub struct ProgressReporter {
    bar: ProgressBar,
    phase: Option<ScanPhase>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            phase: None,
        }
    }

    /// Applies one progress event
    pub fn update(&mut self, event: &ProgressEvent) {
        if self.phase != Some(event.phase) {
            self.enter(event.phase);
        }
        match event.phase {
            ScanPhase::Metadata => self.bar.set_position(event.processed),
            ScanPhase::Carving => {
                if event.total > 0 && self.bar.length() != Some(event.total) {
                    self.bar.set_length(event.total);
                }
                self.bar.set_position(event.processed);
            }
            ScanPhase::Finished => {}
        }
        self.bar.set_message(event.message.clone());
    }

    /// Finishes with a message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn enter(&mut self, phase: ScanPhase) {
        self.bar.finish_and_clear();
        self.bar = match phase {
            ScanPhase::Metadata => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} entries | {msg}")
                {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
            ScanPhase::Carving => {
                let bar = ProgressBar::new(0);
                if let Ok(style) = ProgressStyle::default_bar().template(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                ) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            ScanPhase::Finished => ProgressBar::hidden(),
        };
        self.phase = Some(phase);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
