//! Job-level errors

use crate::domain::repositories::VolumeError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a recovery job from starting or finishing
///
/// `Validation` is raised at construction and the job never starts. The
/// other variants end a running job as `Failed`.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid job request: {0}")]
    Validation(String),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
