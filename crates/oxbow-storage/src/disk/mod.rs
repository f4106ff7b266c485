//! Page-granular disk storage.
//!
//! The buffer pool consumes a [`DiskManager`]: a blocking store of
//! fixed-size pages addressed by [`PageId`]. Two implementations are
//! provided, a file-backed store for real use and an in-memory store for
//! tests and benchmarks.

mod error;
mod file;
mod memory;

pub use error::{DiskError, DiskResult};
pub use file::FileDiskManager;
pub use memory::MemoryDiskManager;

use oxbow_common::constants::PageBuf;
use oxbow_common::types::PageId;

/// A blocking, page-granular persistent store.
///
/// Calls block until the transfer completes. Implementations own their I/O
/// error handling: a failure the store cannot absorb is fatal, because the
/// pool cannot continue with a torn page (see the implementation docs for
/// what each store considers fatal).
pub trait DiskManager: Send + Sync {
    /// Reads the page image for `page_id` into `buf`.
    ///
    /// A page that has never been written reads as all zeroes.
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf);

    /// Writes the page image in `buf` as the new contents of `page_id`.
    fn write_page(&self, page_id: PageId, buf: &PageBuf);

    /// Releases the backing storage for `page_id`.
    ///
    /// The pool never reuses a deallocated page ID; whether and how the
    /// underlying storage is reclaimed is the store's decision.
    fn deallocate_page(&self, page_id: PageId);
}
