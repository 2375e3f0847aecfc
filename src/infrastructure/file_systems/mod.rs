//! Live filesystem access

mod metadata_scanner;

pub use metadata_scanner::{MetadataEntry, MetadataScanner};
