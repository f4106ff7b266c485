//! Buffer pool manager.
//!
//! The pool owns a fixed array of frames and coordinates the free list,
//! the LRU-K replacer, the extendible-hash page table, and the disk
//! manager to implement the page lifecycle: allocate, fetch, pin/unpin,
//! flush, delete.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use oxbow_common::types::{Lsn, PageId};
use oxbow_container::ExtendibleHashTable;
use parking_lot::Mutex;

use super::config::BufferPoolConfig;
use super::error::BufferResult;
use super::frame::{Frame, FrameId};
use super::replacer::LruKReplacer;
use super::BufferPoolStats;
use crate::disk::{DiskManager, FileDiskManager};
use crate::wal::LogManager;

/// A shared reference to a frame handed out by the pool.
///
/// The reference does not carry the pin: the caller must release the pin
/// explicitly with [`BufferPoolManager::unpin_page`] once done with the
/// page.
pub type FrameRef = Arc<Frame>;

/// State mutated only under the pool latch.
struct PoolState {
    /// Frames holding no page, available without eviction.
    free_list: VecDeque<FrameId>,
    /// Next page ID to hand out: the head of `PageId`'s successor chain,
    /// which never steps onto the sentinel. Deallocated IDs are not
    /// reused.
    next_page_id: PageId,
}

/// The buffer pool manager.
///
/// All public operations execute under the pool latch for their full
/// duration, including any disk I/O they issue; the replacer and page
/// table latches are only ever taken nested inside it. Coarse by design —
/// the state machine stays simple and the public invariants hold at every
/// operation boundary.
///
/// Recoverable conditions are reported through return values: an
/// exhausted pool yields `None`, a miss yields `false`. Nothing is raised
/// past the API.
///
/// The pool is volatile: callers that want dirty pages on disk at
/// teardown should invoke [`flush_all`](Self::flush_all) first.
pub struct BufferPoolManager {
    pool_size: usize,
    /// Frame array; stable for the pool's lifetime.
    frames: Vec<Arc<Frame>>,
    /// Outer latch serializing the page lifecycle operations.
    latch: Mutex<PoolState>,
    /// Page table: maps PageId -> FrameId.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// LRU-K replacer tracking eviction candidates.
    replacer: Mutex<LruKReplacer>,
    /// Page store.
    disk: Arc<dyn DiskManager>,
    /// Write-ahead ordering hook; consulted before dirty write-back.
    log: Option<Arc<dyn LogManager>>,
    // Statistics counters.
    fetches: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    flushes: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a buffer pool over the given disk manager.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        config
            .validate()
            .map_err(super::error::BufferError::config)?;

        let frames: Vec<Arc<Frame>> = (0..config.pool_size)
            .map(|i| Arc::new(Frame::new(FrameId::new(i))))
            .collect();
        let free_list: VecDeque<FrameId> = (0..config.pool_size).map(FrameId::new).collect();

        Ok(Self {
            pool_size: config.pool_size,
            frames,
            latch: Mutex::new(PoolState {
                free_list,
                next_page_id: PageId::FIRST,
            }),
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: Mutex::new(LruKReplacer::new(config.pool_size, config.replacer_k)),
            disk,
            log: None,
            fetches: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        })
    }

    /// Creates a buffer pool over a file-backed disk manager at `path`.
    pub fn open(config: BufferPoolConfig, path: impl AsRef<Path>) -> BufferResult<Self> {
        let disk = Arc::new(FileDiskManager::open(path)?);
        Self::new(config, disk)
    }

    /// Attaches a log manager for write-ahead ordering of page flushes.
    #[must_use]
    pub fn with_log_manager(mut self, log: Arc<dyn LogManager>) -> Self {
        self.log = Some(log);
        self
    }

    /// Allocates a brand-new page, pinned in a frame.
    ///
    /// The page image starts zeroed; no disk read is issued. Returns
    /// `None` when every frame is pinned.
    pub fn new_page(&self) -> Option<(PageId, FrameRef)> {
        let mut state = self.latch.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = state.next_page_id;
        debug_assert!(page_id.is_valid());
        state.next_page_id = page_id.next();

        let frame = &self.frames[frame_id.index()];
        frame.zero();
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.set_lsn(Lsn::INVALID);
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        Some((page_id, Arc::clone(frame)))
    }

    /// Fetches the page `page_id`, pinned in a frame.
    ///
    /// A page table hit pins the resident frame without touching the
    /// disk. A miss brings the page in from disk, evicting a victim if no
    /// frame is free. Returns `None` when every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Option<FrameRef> {
        let mut state = self.latch.lock();
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = self.page_table.find(&page_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
            return Some(Arc::clone(frame));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.set_lsn(Lsn::INVALID);
        self.disk.read_page(page_id, &mut frame.write_data());
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        Some(Arc::clone(frame))
    }

    /// Releases one pin on `page_id`, folding `is_dirty` into the frame's
    /// dirty flag.
    ///
    /// Returns `false` if the page is not resident or its pin count is
    /// already zero. When the last pin is released the frame becomes an
    /// eviction candidate.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.lock().set_evictable(frame_id, true);
        }
        true
    }

    /// Writes `page_id`'s frame to disk and clears its dirty flag.
    ///
    /// The write is unconditional and leaves the pin state untouched; it
    /// is legal to flush a pinned page. Returns `false` if the page is
    /// not resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let _state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        self.write_back(&self.frames[frame_id.index()]);
        true
    }

    /// Writes every resident page to disk and clears all dirty flags.
    pub fn flush_all(&self) {
        let _state = self.latch.lock();

        for frame in &self.frames {
            if frame.page_id().is_valid() {
                self.write_back(frame);
            }
        }
    }

    /// Deletes `page_id` from the pool, returning its frame to the free
    /// list and its ID to the disk manager.
    ///
    /// A page that is not resident is vacuously deleted (`true`); a
    /// pinned page cannot be deleted (`false`).
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return true;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() > 0 {
            return false;
        }

        self.page_table.remove(&page_id);
        self.replacer.lock().remove(frame_id);
        frame.reset();
        frame.zero();
        state.free_list.push_back(frame_id);
        self.disk.deallocate_page(page_id);
        true
    }

    /// Returns true if `page_id` is resident in the pool.
    ///
    /// Takes the pool latch like every other operation, so the answer is
    /// consistent with whatever operation linearized last.
    pub fn contains(&self, page_id: PageId) -> bool {
        let _state = self.latch.lock();
        self.page_table.find(&page_id).is_some()
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetches.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
            free_frames: self.latch.lock().free_list.len(),
            evictable_frames: self.replacer.lock().size(),
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Obtains a frame for a new occupant: the free list first, then an
    /// eviction victim. A dirty victim is written back before its frame
    /// is handed out, and its page leaves the page table.
    fn acquire_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Some(frame_id);
        }

        let frame_id = self.replacer.lock().evict()?;
        let frame = &self.frames[frame_id.index()];
        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            self.write_back(frame);
        }
        self.page_table.remove(&old_page_id);
        self.evictions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(frame = %frame_id, page = %old_page_id, "evicted page");
        Some(frame_id)
    }

    /// Writes a frame's page image to disk and clears the dirty flag,
    /// honoring write-ahead ordering when a log manager is attached.
    fn write_back(&self, frame: &Frame) {
        if let Some(log) = &self.log {
            let lsn = frame.lsn();
            if lsn.is_valid() {
                log.flush_until(lsn);
            }
        }
        self.disk.write_page(frame.page_id(), &frame.read_data());
        frame.set_dirty(false);
        self.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(page = %frame.page_id(), "wrote back page");
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.pool_size)
            .field("stats", &self.stats())
            .finish()
    }
}
