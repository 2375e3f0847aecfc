//! Domain entities
//!
//! Core business objects that represent the fundamental concepts
//! in the file recovery domain.

mod carve_hit;
mod file_signature;
mod file_type_selection;
mod recovered_file;
mod scan_progress;

pub use carve_hit::CarveHit;
pub use file_signature::{FileCategory, FileSignature, FileType};
pub use file_type_selection::{FileTypeSelection, extension_of, normalize_extension};
pub use recovered_file::{RecoveredFileRecord, RecoverySource};
pub use scan_progress::{ProgressEvent, ScanPhase};
