//! Job request DTO

use crate::domain::entities::FileTypeSelection;
use crate::infrastructure::block_device::resolve_raw_device;
use std::path::PathBuf;

/// A recovery request as accepted from the caller
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Mount point, drive root, device node or image file
    pub volume_id: String,
    pub selection: FileTypeSelection,
    /// Base directory; the job creates its own subdirectory inside it
    pub output_dir: PathBuf,
    /// Run the carving phase after the metadata phase
    pub deep_scan: bool,
    /// Device to carve instead of the one resolved from `volume_id`
    pub raw_device: Option<String>,
}

impl JobRequest {
    pub fn new(
        volume_id: impl Into<String>,
        selection: FileTypeSelection,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            volume_id: volume_id.into(),
            selection,
            output_dir: output_dir.into(),
            deep_scan: false,
            raw_device: None,
        }
    }

    pub fn with_deep_scan(mut self, deep_scan: bool) -> Self {
        self.deep_scan = deep_scan;
        self
    }

    pub fn with_raw_device(mut self, device: impl Into<String>) -> Self {
        self.raw_device = Some(device.into());
        self
    }

    /// The device the carving phase reads
    pub fn carve_device(&self) -> String {
        match &self.raw_device {
            Some(device) => device.clone(),
            None => resolve_raw_device(&self.volume_id),
        }
    }
}
