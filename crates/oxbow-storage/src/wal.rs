//! Log manager interface point.
//!
//! The buffer pool holds a log manager so recovery can impose write-ahead
//! ordering on page flushes: before a dirty frame is written back, the log
//! must be durable up to that frame's last-modification LSN. Log storage,
//! record formats, and recovery itself live outside this repository.

use oxbow_common::types::Lsn;

/// The write-ahead ordering hook consumed by the buffer pool.
pub trait LogManager: Send + Sync {
    /// Blocks until every log record up to and including `lsn` is durable.
    fn flush_until(&self, lsn: Lsn);
}
