//! Volume reader trait
//!
//! Defines the interface for reading raw bytes from a storage volume.
//! This abstraction allows the domain to work with any storage medium:
//! a block device node, a raw Windows volume, or a disk image file.

use std::io;
use thiserror::Error;

/// Errors that can occur when accessing a volume
#[derive(Error, Debug)]
pub enum VolumeError {
    /// The volume could not be opened (permissions, not found, in use)
    #[error("Cannot open volume {volume}: {source}")]
    Access {
        volume: String,
        #[source]
        source: io::Error,
    },

    /// The device length could not be determined
    #[error("Cannot determine size of volume {volume}: {reason}")]
    SizeUnknown { volume: String, reason: String },

    /// A single read failed; the caller may skip past it
    #[error("Read error at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },
}

impl VolumeError {
    /// Returns true for errors that only affect one read window
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VolumeError::Read { .. })
    }
}

/// Trait for reading raw data from a volume
///
/// The reader exclusively owns its handle; dropping the reader releases
/// it, so every exit path (success, error, cancellation) closes the
/// device exactly once.
///
/// # Example
///
/// ```ignore
/// let mut volume = FileVolume::open("/dev/sdb1")?;
/// let size = volume.size()?;
/// let first = volume.read_chunk(0, 65536)?;
/// ```
pub trait VolumeReader {
    /// Opens the volume for reading
    fn open(volume_id: &str) -> Result<Self, VolumeError>
    where
        Self: Sized;

    /// Returns the identifier this volume was opened with
    fn id(&self) -> &str;

    /// Returns the total size in bytes
    fn size(&self) -> Result<u64, VolumeError>;

    /// Reads up to `length` bytes at `offset`
    ///
    /// Returns fewer bytes only at end of device.
    fn read_chunk(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, VolumeError>;

    /// Releases the handle
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}
