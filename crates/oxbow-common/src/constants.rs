//! System-wide constants for Oxbow.

// =============================================================================
// Page Constants
// =============================================================================

/// Size of a page in bytes (4 KB).
///
/// The page size is a build-time constant: every frame buffer, every disk
/// transfer, and every page image is exactly this many bytes.
pub const PAGE_SIZE: usize = 4 * 1024;

/// A page image: exactly one page worth of bytes.
pub type PageBuf = [u8; PAGE_SIZE];

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default K for the LRU-K replacer (LRU-2).
pub const DEFAULT_REPLACER_K: usize = 2;

/// Default page-table bucket capacity.
///
/// Buckets this small keep extendible-hash probes short while still
/// amortizing directory growth.
pub const DEFAULT_BUCKET_SIZE: usize = 4;
