//! File signature entity
//!
//! Represents the magic bytes that identify a specific file format at the
//! start of a byte window. This is the foundation of file carving.

use serde::Serialize;
use std::fmt;

/// File formats that can be recognized by their leading magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileType {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Rtf,
    Jpg,
    Jpeg,
    Png,
    Gif,
    Bmp,
    Mp4,
    Mov,
    Avi,
    Wmv,
    Mp3,
    Wav,
    Wma,
    Zip,
    Rar,
    SevenZip,
}

const OLE_COMPOUND: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const RIFF: &[u8] = b"RIFF";
const ISO_FTYP: &[u8] = b"ftyp";
const ASF_HEADER_GUID: &[u8] = &[
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];

impl FileType {
    /// Every format with a registered signature
    pub const ALL: [FileType; 23] = [
        FileType::Pdf,
        FileType::Doc,
        FileType::Docx,
        FileType::Xls,
        FileType::Xlsx,
        FileType::Ppt,
        FileType::Pptx,
        FileType::Rtf,
        FileType::Jpg,
        FileType::Jpeg,
        FileType::Png,
        FileType::Gif,
        FileType::Bmp,
        FileType::Mp4,
        FileType::Mov,
        FileType::Avi,
        FileType::Wmv,
        FileType::Mp3,
        FileType::Wav,
        FileType::Wma,
        FileType::Zip,
        FileType::Rar,
        FileType::SevenZip,
    ];

    /// Returns the file extension for this type, including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Pdf => ".pdf",
            FileType::Doc => ".doc",
            FileType::Docx => ".docx",
            FileType::Xls => ".xls",
            FileType::Xlsx => ".xlsx",
            FileType::Ppt => ".ppt",
            FileType::Pptx => ".pptx",
            FileType::Rtf => ".rtf",
            FileType::Jpg => ".jpg",
            FileType::Jpeg => ".jpeg",
            FileType::Png => ".png",
            FileType::Gif => ".gif",
            FileType::Bmp => ".bmp",
            FileType::Mp4 => ".mp4",
            FileType::Mov => ".mov",
            FileType::Avi => ".avi",
            FileType::Wmv => ".wmv",
            FileType::Mp3 => ".mp3",
            FileType::Wav => ".wav",
            FileType::Wma => ".wma",
            FileType::Zip => ".zip",
            FileType::Rar => ".rar",
            FileType::SevenZip => ".7z",
        }
    }

    /// Returns the magic bytes expected at the start of a file of this type
    ///
    /// Container formats share prefixes: every OOXML document is a ZIP
    /// archive, and AVI/WAV are both RIFF. Carving resolves those ties
    /// deterministically (see `SignatureRegistry::best_match`).
    pub fn magic(&self) -> &'static [u8] {
        match self {
            FileType::Pdf => b"%PDF",
            FileType::Doc | FileType::Xls | FileType::Ppt => OLE_COMPOUND,
            FileType::Docx | FileType::Xlsx | FileType::Pptx | FileType::Zip => ZIP_LOCAL_HEADER,
            FileType::Rtf => b"{\\rtf",
            FileType::Jpg | FileType::Jpeg => &[0xFF, 0xD8, 0xFF],
            FileType::Png => &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            FileType::Gif => b"GIF8",
            FileType::Bmp => b"BM",
            FileType::Mp4 | FileType::Mov => ISO_FTYP,
            FileType::Avi | FileType::Wav => RIFF,
            FileType::Wmv | FileType::Wma => ASF_HEADER_GUID,
            FileType::Mp3 => b"ID3",
            FileType::Rar => b"Rar!\x1A\x07",
            FileType::SevenZip => &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C],
        }
    }

    /// Looks up a file type by its normalized extension (".png")
    pub fn from_extension(extension: &str) -> Option<FileType> {
        FileType::ALL
            .into_iter()
            .find(|file_type| file_type.extension() == extension)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A compiled signature: an extension paired with its magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSignature {
    file_type: FileType,
    magic: &'static [u8],
}

impl FileSignature {
    /// Creates the signature for a file type
    pub const fn new(file_type: FileType, magic: &'static [u8]) -> Self {
        Self { file_type, magic }
    }

    /// Returns the file type this signature identifies
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Returns the extension, including the leading dot
    pub fn extension(&self) -> &'static str {
        self.file_type.extension()
    }

    /// Returns the magic bytes
    pub fn magic(&self) -> &'static [u8] {
        self.magic
    }

    /// Checks if the window is at least as long as the magic and begins with it
    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        window.starts_with(self.magic)
    }
}

impl From<FileType> for FileSignature {
    fn from(file_type: FileType) -> Self {
        Self::new(file_type, file_type.magic())
    }
}

/// Groups of extensions offered together when picking what to recover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Documents,
    Images,
    Videos,
    Audio,
    Archives,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Documents,
        FileCategory::Images,
        FileCategory::Videos,
        FileCategory::Audio,
        FileCategory::Archives,
    ];

    /// Returns the extensions in this category
    ///
    /// Not every extension has a signature: `.txt` is only recoverable from
    /// a live directory tree.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileCategory::Documents => &[
                ".doc", ".docx", ".pdf", ".txt", ".rtf", ".xls", ".xlsx", ".ppt", ".pptx",
            ],
            FileCategory::Images => &[".jpg", ".jpeg", ".png", ".gif", ".bmp"],
            FileCategory::Videos => &[".mp4", ".avi", ".mov", ".wmv"],
            FileCategory::Audio => &[".mp3", ".wav", ".wma"],
            FileCategory::Archives => &[".zip", ".rar", ".7z"],
        }
    }

    /// Returns a human-readable name for this category
    pub fn name(&self) -> &'static str {
        match self {
            FileCategory::Documents => "Documents",
            FileCategory::Images => "Images",
            FileCategory::Videos => "Videos",
            FileCategory::Audio => "Audio",
            FileCategory::Archives => "Archives",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.extensions().join(", "))
    }
}
