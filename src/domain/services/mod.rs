//! Domain services
//!
//! Core business logic services that operate on domain entities.

mod carver;
mod signature_registry;

pub use carver::{CarveObserver, CarveSummary, CarvingEngine, DEFAULT_CHUNK_SIZE};
pub use signature_registry::{SignatureMatcher, SignatureRegistry};
