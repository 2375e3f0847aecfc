//! Metadata scanner
//!
//! Walks the live directory tree of a volume and reports every regular file
//! along with its extension when that extension is selected. Unreadable
//! entries are logged and skipped; the walk never fails as a whole.

use crate::domain::entities::FileTypeSelection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// One regular file examined by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub path: PathBuf,
    /// Normalized extension, present only when it is in the selection
    pub extension: Option<String>,
}

impl MetadataEntry {
    pub fn is_selected(&self) -> bool {
        self.extension.is_some()
    }
}

/// Lazy, case-insensitive extension filter over a directory tree
///
/// # Example
///
/// ```ignore
/// let scanner = MetadataScanner::new("/media/usb", selection).exclude(job_dir);
/// for entry in scanner.entries().filter(MetadataEntry::is_selected) {
///     println!("{}", entry.path.display());
/// }
/// ```
pub struct MetadataScanner {
    root: PathBuf,
    selection: FileTypeSelection,
    excluded: Vec<PathBuf>,
    follow_links: bool,
}

impl MetadataScanner {
    pub fn new(root: impl Into<PathBuf>, selection: FileTypeSelection) -> Self {
        Self {
            root: root.into(),
            selection,
            excluded: Vec::new(),
            follow_links: false,
        }
    }

    /// Never descends into `path` (typically the job's own output directory)
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.excluded
            .push(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterates over every regular file under the root, in file-name order
    ///
    /// Yields nothing when the root is not a directory.
    pub fn entries(&self) -> impl Iterator<Item = MetadataEntry> + '_ {
        self.walk_root().into_iter().flat_map(move |root| {
            WalkDir::new(root)
                .follow_links(self.follow_links)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(move |entry| !self.is_excluded(entry))
                .filter_map(move |result| match result {
                    Ok(entry) => self.examine(entry),
                    Err(e) => {
                        let path = e.path().map(|p| p.display().to_string());
                        warn!(path = ?path, error = %e, "skipping unreadable entry");
                        None
                    }
                })
        })
    }

    fn walk_root(&self) -> Option<PathBuf> {
        match fs::metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => {
                Some(fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone()))
            }
            Ok(_) => {
                info!(
                    root = %self.root.display(),
                    "volume is not a directory; no live files to scan"
                );
                None
            }
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "cannot read volume root");
                None
            }
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if self.excluded.is_empty() || !entry.file_type().is_dir() {
            return false;
        }
        let hit = if self.excluded.iter().any(|x| x == entry.path()) {
            true
        } else if self.follow_links || entry.path_is_symlink() {
            fs::canonicalize(entry.path()).is_ok_and(|real| self.excluded.contains(&real))
        } else {
            false
        };
        if hit {
            debug!(path = %entry.path().display(), "skipping output directory");
        }
        hit
    }

    fn examine(&self, entry: DirEntry) -> Option<MetadataEntry> {
        if !entry.file_type().is_file() {
            return None;
        }
        let extension = self.selection.match_path(entry.path());
        Some(MetadataEntry {
            path: entry.into_path(),
            extension,
        })
    }
}
