//! Carve hit entity
//!
//! A signature match found in raw device bytes, together with the content
//! window captured at that position.

use super::file_signature::FileType;

/// A signature found at an absolute device offset
///
/// Transient: produced by the carving engine and handed straight to the
/// writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarveHit {
    offset: u64,
    file_type: FileType,
    payload: Vec<u8>,
}

impl CarveHit {
    pub fn new(offset: u64, file_type: FileType, payload: Vec<u8>) -> Self {
        Self {
            offset,
            file_type,
            payload,
        }
    }

    /// Absolute byte offset of the signature on the device
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// The matched extension, including the leading dot
    pub fn extension(&self) -> &'static str {
        self.file_type.extension()
    }

    /// Bytes captured starting at the signature
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
