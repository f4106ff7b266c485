//! Core types for Oxbow.

mod ids;

pub use ids::{Lsn, PageId};
