//! # oxbow-common
//!
//! Common types and constants for the Oxbow storage engine.
//!
//! This crate provides the foundational vocabulary shared by every Oxbow
//! component:
//!
//! - **Types**: core identifiers (`PageId`, `Lsn`)
//! - **Constants**: page geometry and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use oxbow_common::constants::PAGE_SIZE;
//! use oxbow_common::types::PageId;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert_eq!(PAGE_SIZE, 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::{PageBuf, PAGE_SIZE};
pub use types::{Lsn, PageId};
