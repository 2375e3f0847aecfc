//! Application layer
//!
//! Use cases and application services that orchestrate domain logic.

mod cancellation;
pub mod dto;
mod error;
mod recovery_job;
mod worker;

pub use cancellation::CancellationToken;
pub use error::JobError;
pub use recovery_job::{JobState, RecoveryJob};
pub use worker::{JobEvent, JobHandle, spawn_job};
