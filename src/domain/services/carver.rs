//! Carving engine
//!
//! Reads a volume end-to-end in fixed-size chunks and reports every
//! position where a selected signature starts, including signatures that
//! straddle a chunk boundary.

use crate::domain::entities::{CarveHit, FileTypeSelection};
use crate::domain::repositories::{VolumeError, VolumeReader};
use crate::domain::services::{SignatureMatcher, SignatureRegistry};
use tracing::{debug, info, warn};

/// Default chunk size for raw reads (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Receives carve results as the engine walks the volume
pub trait CarveObserver {
    /// Called for every signature found, in offset order
    fn on_hit(&mut self, hit: CarveHit);

    /// Called at least once per chunk with (processed bytes, total bytes)
    fn on_progress(&mut self, _processed: u64, _total: u64) {}

    /// Polled before each chunk read; returning true stops the scan
    fn should_stop(&self) -> bool {
        false
    }
}

/// Counters for one carving pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarveSummary {
    pub total_bytes: u64,
    pub bytes_scanned: u64,
    pub chunks_read: u64,
    pub read_errors: u64,
    pub hits: u64,
    pub cancelled: bool,
}

/// Chunked signature scanner with boundary overlap
///
/// With chunk size `B` and overlap `O = max_magic_length - 1`, every chunk
/// is read at offset `k*B`. The last `O` bytes of the window are held back
/// and prepended to the next chunk, so each absolute position is tested
/// exactly once with at least `max_magic_length` bytes of lookahead
/// (except at the very end of the readable data).
#[derive(Debug, Clone, Copy)]
pub struct CarvingEngine<'r> {
    registry: &'r SignatureRegistry,
    chunk_size: usize,
}

impl<'r> CarvingEngine<'r> {
    pub fn new(registry: &'r SignatureRegistry, chunk_size: usize) -> Self {
        Self {
            registry,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn with_default_chunk_size(registry: &'r SignatureRegistry) -> Self {
        Self::new(registry, DEFAULT_CHUNK_SIZE)
    }

    /// Chunk size `B`, also the payload length captured per hit
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap width `O`
    pub fn overlap(&self) -> usize {
        self.registry.max_magic_length().saturating_sub(1)
    }

    /// Scans the whole volume
    ///
    /// Fails only when the volume size is unknown. Unreadable chunks are
    /// logged and skipped; the offset still advances by one chunk.
    pub fn carve<V, O>(
        &self,
        volume: &mut V,
        selection: &FileTypeSelection,
        observer: &mut O,
    ) -> Result<CarveSummary, VolumeError>
    where
        V: VolumeReader,
        O: CarveObserver + ?Sized,
    {
        let total = volume.size()?;
        let mut summary = CarveSummary {
            total_bytes: total,
            ..CarveSummary::default()
        };

        let Some(matcher) = self.registry.matcher(selection) else {
            info!(
                volume = volume.id(),
                "no selected type has a signature; skipping carve"
            );
            observer.on_progress(0, total);
            return Ok(summary);
        };

        let chunk = self.chunk_size as u64;
        let overlap = self.overlap();
        let mut window: Vec<u8> = Vec::with_capacity(self.chunk_size + overlap);
        let mut window_start = 0u64;
        let mut base = 0u64;

        debug!(
            volume = volume.id(),
            total,
            chunk_size = self.chunk_size,
            overlap,
            "starting carve"
        );

        while base < total {
            if observer.should_stop() {
                summary.cancelled = true;
                debug!(offset = base, "carve stopped by observer");
                break;
            }

            let want = (total - base).min(chunk) as usize;
            match volume.read_chunk(base, want) {
                Ok(data) => {
                    summary.chunks_read += 1;
                    if window.is_empty() {
                        window_start = base;
                    }
                    let complete = data.len() == want;
                    window.extend_from_slice(&data);

                    let last = !complete || base + chunk >= total;
                    let scan_len = if last {
                        window.len()
                    } else {
                        window.len().saturating_sub(overlap)
                    };

                    self.scan_window(
                        volume,
                        &matcher,
                        &window,
                        window_start,
                        scan_len,
                        &mut summary,
                        observer,
                    );

                    if last {
                        window.clear();
                    } else {
                        window.drain(..scan_len);
                        window_start += scan_len as u64;
                    }
                }
                Err(e) => {
                    warn!(offset = base, error = %e, "skipping unreadable chunk");
                    summary.read_errors += 1;
                    // The held-back tail can no longer be extended; test it as is.
                    let held = window.len();
                    self.scan_window(
                        volume,
                        &matcher,
                        &window,
                        window_start,
                        held,
                        &mut summary,
                        observer,
                    );
                    window.clear();
                }
            }

            base += chunk;
            summary.bytes_scanned = base.min(total);
            observer.on_progress(summary.bytes_scanned, total);
        }

        info!(
            volume = volume.id(),
            bytes = summary.bytes_scanned,
            hits = summary.hits,
            read_errors = summary.read_errors,
            cancelled = summary.cancelled,
            "carve finished"
        );
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_window<V, O>(
        &self,
        volume: &mut V,
        matcher: &SignatureMatcher,
        window: &[u8],
        window_start: u64,
        scan_len: usize,
        summary: &mut CarveSummary,
        observer: &mut O,
    ) where
        V: VolumeReader,
        O: CarveObserver + ?Sized,
    {
        for (pos, signature) in matcher.find(window, scan_len) {
            let offset = window_start + pos as u64;
            match volume.read_chunk(offset, self.chunk_size) {
                Ok(payload) => {
                    summary.hits += 1;
                    debug!(offset, extension = signature.extension(), "signature found");
                    observer.on_hit(CarveHit::new(offset, signature.file_type(), payload));
                }
                Err(e) => {
                    summary.read_errors += 1;
                    warn!(offset, error = %e, "cannot capture payload for signature");
                }
            }
        }
    }
}
