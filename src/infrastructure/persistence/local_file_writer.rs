//! Local file writer implementation
//!
//! Writes recovered files into a per-job directory on the local filesystem.
//! Every file is staged in a `.part` sibling and only renamed into place once
//! its full length is on disk.

use crate::domain::entities::{CarveHit, RecoveredFileRecord, RecoverySource};
use crate::domain::repositories::{RecoveredFileWriter, RecoveryItem, WriteError};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix of every recovered file name
pub const RECOVERED_PREFIX: &str = "recovered_";

/// Prefix of the per-job output directory
pub const JOB_DIR_PREFIX: &str = "recovered_files";

/// Highest collision suffix tried before giving up on a name
const MAX_SUFFIX: u32 = 10_000;

/// Current time as whole seconds since the Unix epoch
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Creates a fresh job directory under `base`
///
/// The directory is `recovered_files_<unix>` (or `recovered_files` when
/// `timestamp_dir` is off), with a `_<n>` suffix when that name is taken.
pub fn create_job_dir(base: &Path, timestamp_dir: bool) -> io::Result<PathBuf> {
    fs::create_dir_all(base)?;

    let stem = if timestamp_dir {
        format!("{}_{}", JOB_DIR_PREFIX, unix_timestamp())
    } else {
        JOB_DIR_PREFIX.to_string()
    };

    for n in 0..MAX_SUFFIX {
        let name = if n == 0 {
            stem.clone()
        } else {
            format!("{}_{}", stem, n)
        };
        let candidate = base.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => {
                debug!(path = %candidate.display(), "created job directory");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free job directory name for {}", stem),
    ))
}

/// Local file system writer
///
/// Destinations are reserved with create-new semantics, so nothing that
/// already exists in the output directory is ever overwritten.
pub struct LocalFileWriter {
    output_dir: PathBuf,
    files_written: u64,
    bytes_written: u64,
}

impl LocalFileWriter {
    /// Creates a writer for `output_dir`, creating the directory if needed
    pub fn new(output_dir: &Path) -> Result<Self, WriteError> {
        fs::create_dir_all(output_dir).map_err(|e| WriteError::io(output_dir, e))?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            files_written: 0,
            bytes_written: 0,
        })
    }

    /// Reserves the first free name produced by `name_for`
    ///
    /// `name_for(0)` is the preferred name; higher values are collision
    /// fallbacks.
    fn reserve(&self, name_for: impl Fn(u32) -> String) -> Result<PathBuf, WriteError> {
        for n in 0..MAX_SUFFIX {
            let candidate = self.output_dir.join(name_for(n));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(WriteError::io(&candidate, e)),
            }
        }
        Err(WriteError::Exhausted { name: name_for(0) })
    }

    /// Stages content in `<destination>.part`, verifies its length and
    /// renames it over the reserved destination
    fn commit(
        &self,
        destination: &Path,
        expected: u64,
        fill: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> Result<(), WriteError> {
        let mut part_name = OsString::from(destination.as_os_str());
        part_name.push(".part");
        let part = PathBuf::from(part_name);

        let result = Self::stage(&part, expected, fill).and_then(|()| {
            fs::rename(&part, destination).map_err(|e| WriteError::io(destination, e))
        });

        if result.is_err() {
            let _ = fs::remove_file(&part);
            let _ = fs::remove_file(destination);
        }
        result
    }

    fn stage(
        part: &Path,
        expected: u64,
        fill: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> Result<(), WriteError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(part)
            .map_err(|e| WriteError::io(part, e))?;

        fill(&mut file).map_err(|e| WriteError::io(part, e))?;
        file.flush().map_err(|e| WriteError::io(part, e))?;

        let actual = file.metadata().map_err(|e| WriteError::io(part, e))?.len();
        if actual != expected {
            return Err(WriteError::ShortWrite {
                path: part.to_path_buf(),
                expected,
                actual,
            });
        }

        file.sync_all().map_err(|e| WriteError::io(part, e))
    }

    fn write_live_file(&mut self, source: &Path) -> Result<RecoveredFileRecord, WriteError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| {
                WriteError::io(
                    source,
                    io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?
            .to_string_lossy()
            .into_owned();

        let mut input = File::open(source).map_err(|e| WriteError::io(source, e))?;
        let expected = input
            .metadata()
            .map_err(|e| WriteError::io(source, e))?
            .len();

        let destination = self.reserve(|n| metadata_name(&file_name, n))?;
        self.commit(&destination, expected, |out| {
            io::copy(&mut input, out).map(|_| ())
        })?;

        Ok(RecoveredFileRecord::new(
            RecoverySource::Metadata {
                path: source.to_path_buf(),
            },
            destination,
            expected,
        ))
    }

    fn write_carved(&mut self, hit: &CarveHit) -> Result<RecoveredFileRecord, WriteError> {
        let timestamp = unix_timestamp();
        let destination = self.reserve(|n| carved_name(hit, timestamp, n))?;

        let payload = hit.payload();
        self.commit(&destination, payload.len() as u64, |out| {
            out.write_all(payload)
        })?;

        Ok(RecoveredFileRecord::new(
            RecoverySource::Carved {
                offset: hit.offset(),
                file_type: hit.file_type(),
            },
            destination,
            payload.len() as u64,
        ))
    }
}

impl RecoveredFileWriter for LocalFileWriter {
    fn write(&mut self, item: RecoveryItem<'_>) -> Result<RecoveredFileRecord, WriteError> {
        let record = match item {
            RecoveryItem::File(path) => self.write_live_file(path)?,
            RecoveryItem::Carved(hit) => self.write_carved(hit)?,
        };

        self.files_written += 1;
        self.bytes_written += record.size();

        info!(
            source = %record.source(),
            destination = %record.destination().display(),
            size = record.size(),
            "recovered file"
        );
        Ok(record)
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn files_written(&self) -> u64 {
        self.files_written
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// `recovered_<name>`, or `recovered_<stem>_<n><ext>` on collision
fn metadata_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return format!("{}{}", RECOVERED_PREFIX, file_name);
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    match path.extension() {
        Some(ext) => format!("{}{}_{}.{}", RECOVERED_PREFIX, stem, n, ext.to_string_lossy()),
        None => format!("{}{}_{}", RECOVERED_PREFIX, stem, n),
    }
}

/// `recovered_file_<offset>_<unix><ext>`, or with `_<n>` before the
/// extension on collision
fn carved_name(hit: &CarveHit, timestamp: i64, n: u32) -> String {
    if n == 0 {
        format!(
            "{}file_{}_{}{}",
            RECOVERED_PREFIX,
            hit.offset(),
            timestamp,
            hit.extension()
        )
    } else {
        format!(
            "{}file_{}_{}_{}{}",
            RECOVERED_PREFIX,
            hit.offset(),
            timestamp,
            n,
            hit.extension()
        )
    }
}
