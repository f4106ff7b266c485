//! In-memory disk manager for tests and benchmarks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use oxbow_common::constants::PageBuf;
use oxbow_common::types::PageId;
use parking_lot::Mutex;

use super::DiskManager;

/// A disk manager that keeps every page image in memory.
///
/// Besides being fast, it records read/write counts and deallocations so
/// tests can assert on the pool's I/O behavior (for example, that a page
/// table hit issues no disk read).
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<PageBuf>>>,
    deallocated: Mutex<HashSet<PageId>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryDiskManager {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored image of `page_id`, if any write reached it.
    pub fn page_on_disk(&self, page_id: PageId) -> Option<Box<PageBuf>> {
        self.pages.lock().get(&page_id).cloned()
    }

    /// Returns true if `page_id` has been deallocated.
    pub fn was_deallocated(&self, page_id: PageId) -> bool {
        self.deallocated.lock().contains(&page_id)
    }

    /// Returns the number of page reads served.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of page writes received.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.pages.lock().get(&page_id) {
            Some(page) => buf.copy_from_slice(&page[..]),
            None => buf.fill(0),
        }
    }

    fn write_page(&self, page_id: PageId, buf: &PageBuf) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.pages.lock().insert(page_id, Box::new(*buf));
    }

    fn deallocate_page(&self, page_id: PageId) {
        self.pages.lock().remove(&page_id);
        self.deallocated.lock().insert(page_id);
    }
}

impl std::fmt::Debug for MemoryDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDiskManager")
            .field("pages", &self.pages.lock().len())
            .field("reads", &self.reads())
            .field("writes", &self.writes())
            .finish()
    }
}
