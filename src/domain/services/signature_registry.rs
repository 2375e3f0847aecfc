//! Signature registry service
//!
//! Manages the collection of file signatures used for file carving.
//! Uses Aho-Corasick for multi-pattern matching over whole read windows,
//! with a linear per-position check as the reference semantics.

use crate::domain::entities::{FileSignature, FileType, FileTypeSelection, normalize_extension};
use aho_corasick::AhoCorasick;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static BUILTIN: LazyLock<SignatureRegistry> = LazyLock::new(SignatureRegistry::builtin);

/// Registry of file signatures keyed by extension
///
/// Pure lookup: no state beyond the compiled table.
///
/// # Example
///
/// ```
/// use reclaim::domain::services::SignatureRegistry;
///
/// let registry = SignatureRegistry::global();
/// let png = b"\x89PNG\r\n\x1a\n....";
/// assert!(registry.matches(png, ".png"));
/// assert!(!registry.matches(png, ".jpg"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignatureRegistry {
    signatures: Vec<FileSignature>,
    max_magic_len: usize,
}

impl SignatureRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in signature
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for file_type in FileType::ALL {
            registry.register(file_type.into());
        }
        registry
    }

    /// Shared built-in registry, compiled once
    pub fn global() -> &'static SignatureRegistry {
        &BUILTIN
    }

    /// Registers a signature, replacing any previous one for the same type
    pub fn register(&mut self, signature: FileSignature) {
        self.signatures
            .retain(|s| s.file_type() != signature.file_type());
        self.signatures.push(signature);
        self.max_magic_len = self
            .signatures
            .iter()
            .map(|s| s.magic().len())
            .max()
            .unwrap_or(0);
    }

    /// Returns the magic bytes registered for an extension
    pub fn lookup(&self, extension: &str) -> Option<&'static [u8]> {
        self.signature_for(extension).map(|s| s.magic())
    }

    /// True iff `window` is at least as long as the extension's magic and begins with it
    pub fn matches(&self, window: &[u8], extension: &str) -> bool {
        self.signature_for(extension)
            .is_some_and(|s| s.matches(window))
    }

    /// Length of the longest registered magic; bounds the carving overlap
    pub fn max_magic_length(&self) -> usize {
        self.max_magic_len
    }

    /// Returns all registered signatures
    pub fn signatures(&self) -> &[FileSignature] {
        &self.signatures
    }

    /// Returns the number of registered signatures
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Picks the signature matching at the start of `window` among the selection
    ///
    /// Ties go to the longest magic, then to the lexicographically smallest
    /// extension.
    pub fn best_match(
        &self,
        window: &[u8],
        selection: &FileTypeSelection,
    ) -> Option<FileSignature> {
        self.signatures
            .iter()
            .filter(|s| selection.contains(s.extension()) && s.matches(window))
            .copied()
            .min_by(preference)
    }

    /// Compiles a matcher for the carvable part of a selection
    ///
    /// Returns None when nothing in the selection has a signature.
    pub fn matcher(&self, selection: &FileTypeSelection) -> Option<SignatureMatcher> {
        let mut candidates: Vec<FileSignature> = self
            .signatures
            .iter()
            .filter(|s| selection.contains(s.extension()))
            .copied()
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by(preference);

        // One pattern per distinct magic; the first candidate wins it.
        let mut winners: Vec<FileSignature> = Vec::new();
        for candidate in candidates {
            if !winners.iter().any(|w| w.magic() == candidate.magic()) {
                winners.push(candidate);
            }
        }

        let patterns: Vec<&[u8]> = winners.iter().map(|w| w.magic()).collect();
        let automaton = match AhoCorasick::new(&patterns) {
            Ok(ac) => Some(ac),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to linear signature matching");
                None
            }
        };

        Some(SignatureMatcher { automaton, winners })
    }

    fn signature_for(&self, extension: &str) -> Option<&FileSignature> {
        let extension = normalize_extension(extension)?;
        self.signatures.iter().find(|s| s.extension() == extension)
    }
}

/// Orders signatures by carving preference: longer magic first, then extension
fn preference(a: &FileSignature, b: &FileSignature) -> Ordering {
    b.magic()
        .len()
        .cmp(&a.magic().len())
        .then_with(|| a.extension().cmp(b.extension()))
}

/// Signature matcher compiled for one selection
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    automaton: Option<AhoCorasick>,
    /// Preferred signature for each distinct magic, in preference order
    winners: Vec<FileSignature>,
}

impl SignatureMatcher {
    /// Finds the preferred signature at every position in `[0, scan_len)`
    ///
    /// A signature only counts if it lies entirely inside `window`. Results
    /// are sorted by position, one per position.
    pub fn find(&self, window: &[u8], scan_len: usize) -> Vec<(usize, FileSignature)> {
        let scan_len = scan_len.min(window.len());
        let Some(automaton) = &self.automaton else {
            return self.find_linear(window, scan_len);
        };

        let mut best: BTreeMap<usize, FileSignature> = BTreeMap::new();
        for m in automaton.find_overlapping_iter(window) {
            if m.start() >= scan_len {
                continue;
            }
            let candidate = self.winners[m.pattern().as_usize()];
            best.entry(m.start())
                .and_modify(|current| {
                    if preference(&candidate, current) == Ordering::Less {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
        best.into_iter().collect()
    }

    /// Per-position reference implementation
    pub fn find_linear(&self, window: &[u8], scan_len: usize) -> Vec<(usize, FileSignature)> {
        (0..scan_len.min(window.len()))
            .filter_map(|pos| {
                self.winners
                    .iter()
                    .find(|s| s.matches(&window[pos..]))
                    .map(|s| (pos, *s))
            })
            .collect()
    }

    /// Signatures this matcher can report, in preference order
    pub fn signatures(&self) -> &[FileSignature] {
        &self.winners
    }
}
