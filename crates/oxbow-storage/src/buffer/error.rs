//! Buffer pool errors.
//!
//! Only construction-time conditions surface as errors. The pool's page
//! lifecycle operations report recoverable conditions through their return
//! values (`Option` / `bool`) and never raise.

use thiserror::Error;

use crate::disk::DiskError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur while constructing a buffer pool.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },

    /// The backing disk manager could not be opened.
    #[error(transparent)]
    Disk(#[from] DiskError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
