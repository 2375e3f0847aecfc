//! Data Transfer Objects

mod job_report;
mod job_request;
mod scan_options;

pub use job_report::{JobOutcome, JobReport, JobStats};
pub use job_request::JobRequest;
pub use scan_options::ScanOptions;
