//! # oxbow-storage
//!
//! Buffer pool storage core for Oxbow.
//!
//! This crate mediates between page-granular persistent storage and the
//! higher-level database components (indexes, table heaps, executors):
//!
//! - **Buffer pool**: a fixed pool of in-memory frames with strict
//!   pin/unpin reference counting, dirty tracking, and LRU-K eviction
//! - **Page table**: an extendible-hash map from page ID to frame slot
//! - **Disk managers**: blocking page stores (file-backed and in-memory)

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Buffer pool manager, frames, and the LRU-K replacer
pub mod buffer;

/// Page-granular disk storage
pub mod disk;

/// Log manager interface point
pub mod wal;
