//! Concurrent container structures for Oxbow.
//!
//! This crate provides the generic data structures the storage engine
//! builds on:
//!
//! - **Extendible hash table**: a concurrent map that grows by local
//!   bucket splits instead of full rehashes
//!
//! # Example
//!
//! ```rust
//! use oxbow_container::ExtendibleHashTable;
//!
//! let table = ExtendibleHashTable::new(4);
//! table.insert(1u64, "one");
//! assert_eq!(table.find(&1), Some("one"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible_hash;

pub use extendible_hash::ExtendibleHashTable;
