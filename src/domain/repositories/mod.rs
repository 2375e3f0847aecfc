//! Repository traits (interfaces)
//!
//! These traits define the contracts for external dependencies.
//! They follow the Dependency Inversion Principle (DIP) from SOLID.

mod file_writer;
mod volume;

pub use file_writer::{RecoveredFileWriter, RecoveryItem, WriteError};
pub use volume::{VolumeError, VolumeReader};
