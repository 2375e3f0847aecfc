//! Output persistence

mod local_file_writer;

pub use local_file_writer::{
    JOB_DIR_PREFIX, LocalFileWriter, RECOVERED_PREFIX, create_job_dir, unix_timestamp,
};
