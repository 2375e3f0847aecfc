//! File-backed volume implementation
//!
//! Provides raw read access to block devices, raw Windows volumes and
//! disk image files through a plain file handle.

use crate::domain::repositories::{VolumeError, VolumeReader};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Reads are issued from offsets aligned to this many bytes
pub const SECTOR_ALIGN: u64 = 4096;

/// Volume reader over a file handle
///
/// Reads are widened to sector-aligned spans and trimmed before being
/// returned; raw Windows volumes reject unaligned reads.
///
/// # Example
///
/// ```ignore
/// let mut volume = FileVolume::open("/dev/sdb1")?;
/// let data = volume.read_chunk(0, 512)?;
/// ```
pub struct FileVolume {
    file: File,
    id: String,
    size: Result<u64, String>,
}

impl FileVolume {
    fn open_file(path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.read(true);

        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            use windows_sys::Win32::Storage::FileSystem::{FILE_SHARE_READ, FILE_SHARE_WRITE};
            options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE);
        }

        let file = options.open(path)?;
        if file.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "is a directory, not a device or image",
            ));
        }
        Ok(file)
    }

    /// Determines the device length, trying the cheapest source first
    fn detect_size(file: &File) -> Result<u64, String> {
        let metadata = file.metadata().map_err(|e| e.to_string())?;
        if metadata.is_file() {
            return Ok(metadata.len());
        }

        match device_length(file) {
            Ok(size) if size > 0 => return Ok(size),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "device length ioctl failed, trying seek"),
        }

        let mut handle = file;
        let end = handle.seek(SeekFrom::End(0)).map_err(|e| e.to_string())?;
        handle
            .seek(SeekFrom::Start(0))
            .map_err(|e| e.to_string())?;
        if end == 0 {
            Err("device reports zero length".to_string())
        } else {
            Ok(end)
        }
    }

    fn read_span(&mut self, aligned: u64, span: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(aligned))?;
        let mut buffer = vec![0u8; span];
        let mut filled = 0;
        while filled < span {
            match self.file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buffer.truncate(filled);
        Ok(buffer)
    }
}

impl VolumeReader for FileVolume {
    fn open(volume_id: &str) -> Result<Self, VolumeError> {
        let file = Self::open_file(Path::new(volume_id)).map_err(|source| VolumeError::Access {
            volume: volume_id.to_string(),
            source,
        })?;
        let size = Self::detect_size(&file);

        debug!(volume = volume_id, size = ?size, "opened volume");

        Ok(Self {
            file,
            id: volume_id.to_string(),
            size,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn size(&self) -> Result<u64, VolumeError> {
        self.size.clone().map_err(|reason| VolumeError::SizeUnknown {
            volume: self.id.clone(),
            reason,
        })
    }

    fn read_chunk(&mut self, offset: u64, length: usize) -> Result<Vec<u8>, VolumeError> {
        let mut end = offset.saturating_add(length as u64);
        if let Ok(size) = self.size {
            end = end.min(size);
        }
        if length == 0 || offset >= end {
            return Ok(Vec::new());
        }

        let aligned = offset - offset % SECTOR_ALIGN;
        let mut span_end = end.div_ceil(SECTOR_ALIGN) * SECTOR_ALIGN;
        if let Ok(size) = self.size {
            span_end = span_end.min(size);
        }
        let skip = (offset - aligned) as usize;

        let mut data = self
            .read_span(aligned, (span_end - aligned) as usize)
            .map_err(|source| VolumeError::Read { offset, source })?;

        if data.len() <= skip {
            return Ok(Vec::new());
        }
        data.truncate(skip + (end - offset) as usize);
        data.drain(..skip);
        Ok(data)
    }
}

impl Drop for FileVolume {
    fn drop(&mut self) {
        debug!(volume = %self.id, "closed volume");
    }
}

#[cfg(target_os = "linux")]
fn device_length(file: &File) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    const BLKGETSIZE64: libc::c_ulong = 0x80081272;

    let mut size: u64 = 0;
    let result = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64 as _, &mut size as *mut u64) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(size)
    }
}

#[cfg(windows)]
fn device_length(file: &File) -> io::Result<u64> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::System::IO::DeviceIoControl;
    use windows_sys::Win32::System::Ioctl::{GET_LENGTH_INFORMATION, IOCTL_DISK_GET_LENGTH_INFO};

    let mut info = GET_LENGTH_INFORMATION { Length: 0 };
    let mut returned = 0u32;
    let ok = unsafe {
        DeviceIoControl(
            file.as_raw_handle() as _,
            IOCTL_DISK_GET_LENGTH_INFO,
            std::ptr::null(),
            0,
            (&mut info as *mut GET_LENGTH_INFORMATION).cast(),
            std::mem::size_of::<GET_LENGTH_INFORMATION>() as u32,
            &mut returned,
            std::ptr::null_mut(),
        )
    };

    if ok == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(info.Length as u64)
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
fn device_length(_file: &File) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Not supported on this platform",
    ))
}
