//! File type selection entity
//!
//! The set of extensions requested for a recovery job.

use super::file_signature::{FileCategory, FileType};
use std::collections::BTreeSet;
use std::path::Path;

/// Deduplicated, case-normalized set of extensions (".jpg", ".pdf", ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeSelection {
    extensions: BTreeSet<String>,
}

impl FileTypeSelection {
    /// Creates a selection from raw extension strings
    ///
    /// Accepts "png", ".PNG" and " .png " alike. Blank entries are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        Self { extensions }
    }

    /// Creates a selection holding every extension of the given categories
    pub fn from_categories(categories: &[FileCategory]) -> Self {
        Self::new(categories.iter().flat_map(|c| c.extensions().iter()))
    }

    /// Adds one extension; returns false if it was blank or already present
    pub fn insert(&mut self, extension: &str) -> bool {
        match normalize_extension(extension) {
            Some(ext) => self.extensions.insert(ext),
            None => false,
        }
    }

    /// Adds every extension of a category
    pub fn extend_category(&mut self, category: FileCategory) {
        for ext in category.extensions() {
            self.insert(ext);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Checks membership, normalizing the probe first
    pub fn contains(&self, extension: &str) -> bool {
        normalize_extension(extension).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Returns the selected extension of a path, if it has one
    pub fn match_path(&self, path: &Path) -> Option<String> {
        extension_of(path).filter(|ext| self.extensions.contains(ext))
    }

    /// Iterates over the normalized extensions in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Selected extensions that have a carving signature
    pub fn carvable_types(&self) -> Vec<FileType> {
        self.iter().filter_map(FileType::from_extension).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FileTypeSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Normalizes an extension to lowercase with a single leading dot
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Returns the normalized extension of a path (".jpg"), if any
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(normalize_extension)
}
