//! Result cache and debouncer
//!
//! Memoizes the last scan of every open document, keyed by document id and
//! version, and coalesces bursts of edits into one rescan per document.
//!
//! A [`BlockCache`] is constructed explicitly and handed to whoever needs
//! it; clones share the same state.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::{DetectionSettings, Settings};
use crate::error::{ErrfoldError, Result};
use crate::scanner::{BlockDescriptor, BlockScanner, HeaderMatcher};

/// Default time-to-live of a cache entry
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// Shared, immutable scan result
pub type Blocks = Arc<[BlockDescriptor]>;

struct CacheEntry {
    version: i32,
    blocks: Blocks,
    timestamp: Instant,
}

struct PendingScan {
    generation: u64,
    handle: JoinHandle<()>,
}

struct CacheState {
    scanner: Arc<BlockScanner>,
    entries: HashMap<String, CacheEntry>,
    timers: HashMap<String, PendingScan>,
    /// Held for the duration of a document's scan
    scan_guards: HashMap<String, Arc<Mutex<()>>>,
    next_generation: u64,
}

struct Shared {
    state: Mutex<CacheState>,
    ttl: Duration,
    debounce: Duration,
    scans: AtomicU64,
}

/// Per-document cache of scan results with debounced rescans
#[derive(Clone)]
pub struct BlockCache {
    shared: Arc<Shared>,
}

impl fmt::Debug for BlockCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCache")
            .field("ttl", &self.shared.ttl)
            .field("debounce", &self.shared.debounce)
            .field("scans", &self.scan_count())
            .finish_non_exhaustive()
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new(BlockScanner::default())
    }
}

impl BlockCache {
    /// Create a cache around `scanner` with the default TTL
    pub fn new(scanner: BlockScanner) -> Self {
        Self::with_timing(scanner, DEFAULT_TTL, Settings::default().cache.debounce())
    }

    /// Create a cache with an explicit TTL and debounce delay
    pub fn with_timing(scanner: BlockScanner, ttl: Duration, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheState {
                    scanner: Arc::new(scanner),
                    entries: HashMap::new(),
                    timers: HashMap::new(),
                    scan_guards: HashMap::new(),
                    next_generation: 0,
                }),
                ttl,
                debounce,
                scans: AtomicU64::new(0),
            }),
        }
    }

    /// Create a cache from loaded settings.
    ///
    /// If the configured fragments cannot be compiled the cache still comes
    /// up, detecting nothing until it is reconfigured.
    pub fn from_settings(settings: &Settings) -> Self {
        let scanner = BlockScanner::from_settings(settings).unwrap_or_else(|e| {
            warn!("Falling back to an empty header pattern: {}", e);
            BlockScanner::from_matcher(HeaderMatcher::never())
                .with_preview_chars(settings.display.max_preview_chars)
        });
        Self::with_timing(scanner, settings.cache.ttl(), settings.cache.debounce())
    }

    /// Entry time-to-live
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Configured quiet period for [`BlockCache::schedule_debounced`]
    pub fn debounce_delay(&self) -> Duration {
        self.shared.debounce
    }

    /// Return the blocks for `doc_id` at `version`, scanning only on a miss.
    ///
    /// A hit needs the same version and an entry younger than the TTL. On a
    /// miss the scan runs under the document's own guard, outside the cache
    /// lock, so only scans of the same document wait on each other.
    pub fn get_or_scan<S: AsRef<str>>(&self, doc_id: &str, version: i32, lines: &[S]) -> Blocks {
        if let Some(blocks) = self.fresh_blocks(doc_id, version) {
            trace!("Cache hit for {} (version {})", doc_id, version);
            return blocks;
        }

        let guard = self.scan_guard(doc_id);
        let _scanning = guard.lock();

        // Another writer may have filled the entry while we waited
        if let Some(blocks) = self.fresh_blocks(doc_id, version) {
            return blocks;
        }

        let scanner = Arc::clone(&self.shared.state.lock().scanner);
        let blocks: Blocks = scanner.scan(lines).into();
        self.shared.scans.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Scanned {} (version {}): {} foldable blocks",
            doc_id,
            version,
            blocks.len()
        );

        self.shared.state.lock().entries.insert(
            doc_id.to_string(),
            CacheEntry {
                version,
                blocks: Arc::clone(&blocks),
                timestamp: Instant::now(),
            },
        );
        blocks
    }

    fn fresh_blocks(&self, doc_id: &str, version: i32) -> Option<Blocks> {
        let state = self.shared.state.lock();
        let entry = state.entries.get(doc_id)?;
        if entry.version == version && entry.timestamp.elapsed() < self.shared.ttl {
            Some(Arc::clone(&entry.blocks))
        } else {
            None
        }
    }

    fn scan_guard(&self, doc_id: &str) -> Arc<Mutex<()>> {
        let mut state = self.shared.state.lock();
        Arc::clone(state.scan_guards.entry(doc_id.to_string()).or_default())
    }

    /// Drop the cached result for `doc_id`
    pub fn invalidate(&self, doc_id: &str) {
        if self.shared.state.lock().entries.remove(doc_id).is_some() {
            debug!("Invalidated cached blocks for {}", doc_id);
        }
    }

    /// Rescan `doc_id` once edits have been quiet for `delay`.
    ///
    /// Any timer already pending for the document is cancelled, so a burst
    /// of calls results in one scan of the lines passed last. The result is
    /// handed to `callback` on the Tokio runtime.
    pub fn schedule_debounced<F>(
        &self,
        doc_id: &str,
        version: i32,
        lines: Vec<String>,
        delay: Duration,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce(Blocks) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| ErrfoldError::NoRuntime)?;

        let mut state = self.shared.state.lock();
        state.next_generation += 1;
        let generation = state.next_generation;

        let cache = self.clone();
        let key = doc_id.to_string();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            cache.fire_pending(&key, generation, version, &lines, callback);
        });

        if let Some(previous) = state
            .timers
            .insert(doc_id.to_string(), PendingScan { generation, handle })
        {
            previous.handle.abort();
            trace!("Superseded pending scan for {}", doc_id);
        }
        Ok(())
    }

    /// Run a timer's scan unless a newer schedule replaced it meanwhile
    fn fire_pending<F>(
        &self,
        doc_id: &str,
        generation: u64,
        version: i32,
        lines: &[String],
        callback: F,
    ) where
        F: FnOnce(Blocks),
    {
        {
            let mut state = self.shared.state.lock();
            let current = state
                .timers
                .get(doc_id)
                .is_some_and(|pending| pending.generation == generation);
            if !current {
                trace!("Dropping stale timer for {}", doc_id);
                return;
            }
            state.timers.remove(doc_id);
        }

        let blocks = self.get_or_scan(doc_id, version, lines);
        callback(blocks);
    }

    /// Cancel the pending debounced scan for `doc_id`, if any
    pub fn cancel_pending(&self, doc_id: &str) -> bool {
        match self.shared.state.lock().timers.remove(doc_id) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forget everything about a closed document
    pub fn close_document(&self, doc_id: &str) {
        self.cancel_pending(doc_id);
        self.invalidate(doc_id);
        self.shared.state.lock().scan_guards.remove(doc_id);
    }

    /// Swap in new detection settings.
    ///
    /// The matcher is rebuilt only when the fragment set changed. Cached
    /// entries are kept; invalidate documents to apply the change at once.
    pub fn reconfigure(&self, detection: &DetectionSettings) -> Result<bool> {
        let mut state = self.shared.state.lock();
        if state
            .scanner
            .matcher()
            .is_built_from(&detection.error_variables)
        {
            return Ok(false);
        }

        let matcher = HeaderMatcher::new(&detection.error_variables)?;
        let preview_chars = state.scanner.preview_chars();
        state.scanner = Arc::new(
            BlockScanner::from_matcher(matcher).with_preview_chars(preview_chars),
        );
        debug!(
            "Rebuilt header matcher for fragments {:?}",
            detection.error_variables
        );
        Ok(true)
    }

    /// Cancel every pending timer and clear all entries
    pub fn dispose_all(&self) {
        let mut state = self.shared.state.lock();
        let pending = state.timers.len();
        for (_, timer) in state.timers.drain() {
            timer.handle.abort();
        }
        state.entries.clear();
        state.scan_guards.clear();
        debug!("Disposed block cache ({} pending scans cancelled)", pending);
    }

    /// Number of real scans performed since creation
    pub fn scan_count(&self) -> u64 {
        self.shared.scans.load(Ordering::Relaxed)
    }

    /// Number of debounced scans waiting to fire
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().timers.len()
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests;
