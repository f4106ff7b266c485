//! Disk manager errors.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for disk manager operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors a disk manager surfaces to its caller.
///
/// Only conditions the caller can meaningfully handle are surfaced;
/// mid-operation transfer failures are dealt with inside the store.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Failed to open or create the data file.
    #[error("cannot open data file {path}: {source}")]
    Open {
        /// Path of the file that could not be opened.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// I/O error while syncing the data file.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O failure.
        #[from]
        source: io::Error,
    },
}

impl DiskError {
    /// Creates an open error for the given path.
    pub fn open(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
