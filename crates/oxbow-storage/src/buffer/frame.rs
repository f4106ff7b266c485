//! Buffer frame - a slot in the buffer pool that holds a page.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use oxbow_common::constants::{PageBuf, PAGE_SIZE};
use oxbow_common::types::{Lsn, PageId};
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// Index of a slot in the pool's frame array.
///
/// Frame indices are dense and live as long as the pool: slot `i` is
/// `FrameId(i)` from construction to teardown. That stability is what
/// lets the page table store frame IDs as plain values and the replacer
/// thread its queues through a flat per-frame node array; there is no
/// "no frame" sentinel because a frame ID only ever exists for a real
/// slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    /// Wraps a raw slot index.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A buffer frame holds a single page in memory.
///
/// Each frame has:
/// - A fixed-size data buffer for the page image
/// - Metadata (page_id, dirty flag, pin count, last-modification LSN)
/// - A latch for concurrent access to the page image
///
/// Metadata uses atomics so readers never contend with the page latch;
/// mutations happen under the pool latch.
pub struct Frame {
    /// Frame ID (index in the frame array).
    frame_id: FrameId,
    /// Page image.
    data: RwLock<Box<PageBuf>>,
    /// Page ID resident in this frame (INVALID if free).
    page_id: AtomicU32,
    /// Pin count (number of outstanding references).
    pin_count: AtomicU32,
    /// Whether the page image was modified since the last write-back.
    dirty: AtomicBool,
    /// LSN of the last modification, for write-ahead ordering.
    lsn: AtomicU64,
}

impl Frame {
    /// Creates a new free frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
            page_id: AtomicU32::new(PageId::INVALID.as_u32()),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            lsn: AtomicU64::new(Lsn::INVALID.as_u64()),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID resident in this frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Sets the resident page ID.
    #[inline]
    pub fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_u32(), Ordering::Release);
    }

    /// Returns true if no page is resident in this frame.
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.page_id().is_valid()
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// The caller must have checked that the frame is pinned.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets the dirty flag.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns the LSN of the last modification.
    #[inline]
    pub fn lsn(&self) -> Lsn {
        Lsn::new(self.lsn.load(Ordering::Acquire))
    }

    /// Sets the last-modification LSN.
    #[inline]
    pub fn set_lsn(&self, lsn: Lsn) {
        self.lsn.store(lsn.as_u64(), Ordering::Release);
    }

    /// Returns a read lock on the page image.
    #[inline]
    pub fn read_data(&self) -> MappedRwLockReadGuard<'_, PageBuf> {
        RwLockReadGuard::map(self.data.read(), |b| &**b)
    }

    /// Returns a write lock on the page image.
    #[inline]
    pub fn write_data(&self) -> MappedRwLockWriteGuard<'_, PageBuf> {
        RwLockWriteGuard::map(self.data.write(), |b| &mut **b)
    }

    /// Zeroes the page image.
    pub fn zero(&self) {
        self.data.write().fill(0);
    }

    /// Resets the frame metadata to the free state.
    ///
    /// The page image is left as-is; callers zero it separately when the
    /// contents must not leak into the frame's next occupant.
    pub fn reset(&self) {
        self.page_id
            .store(PageId::INVALID.as_u32(), Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        self.lsn.store(Lsn::INVALID.as_u64(), Ordering::Release);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .field("lsn", &self.lsn())
            .finish()
    }
}
