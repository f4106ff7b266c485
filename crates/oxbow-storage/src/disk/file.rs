//! File-backed disk manager.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use oxbow_common::constants::{PageBuf, PAGE_SIZE};
use oxbow_common::types::PageId;
use parking_lot::Mutex;

use super::error::{DiskError, DiskResult};
use super::DiskManager;

/// A disk manager backed by a single data file.
///
/// Page `p` lives at byte offset `p * PAGE_SIZE`. The file is guarded by a
/// mutex, so transfers are serialized; the buffer pool issues its I/O
/// under its own latch anyway.
///
/// Reads past the end of the file zero-fill the buffer, so a page that has
/// been allocated but never written reads as all zeroes. A transfer that
/// fails mid-operation aborts the process: the pool must never observe a
/// torn page.
pub struct FileDiskManager {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileDiskManager {
    /// Opens (creating if absent) the data file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| DiskError::open(&path, e))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes file contents and metadata to stable storage.
    pub fn sync(&self) -> DiskResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    #[inline]
    fn offset(page_id: PageId) -> u64 {
        u64::from(page_id.as_u32()) * PAGE_SIZE as u64
    }

    fn read_at(file: &mut File, offset: u64, buf: &mut PageBuf) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break, // short file: the tail of the page reads as zeroes
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf[filled..].fill(0);
        Ok(())
    }

    fn write_at(file: &mut File, offset: u64, buf: &PageBuf) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut PageBuf) {
        let mut file = self.file.lock();
        if let Err(e) = Self::read_at(&mut file, Self::offset(page_id), buf) {
            tracing::error!(page = %page_id, path = %self.path.display(), "page read failed: {e}");
            panic!("disk read failed for page {page_id}: {e}");
        }
    }

    fn write_page(&self, page_id: PageId, buf: &PageBuf) {
        let mut file = self.file.lock();
        if let Err(e) = Self::write_at(&mut file, Self::offset(page_id), buf) {
            tracing::error!(page = %page_id, path = %self.path.display(), "page write failed: {e}");
            panic!("disk write failed for page {page_id}: {e}");
        }
    }

    fn deallocate_page(&self, _page_id: PageId) {
        // The file store does not reclaim page slots; space reuse is a
        // catalog-level concern.
    }
}

impl std::fmt::Debug for FileDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDiskManager")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.db");

        let disk = FileDiskManager::open(&path).unwrap();
        assert_eq!(disk.path(), path);
        assert!(path.exists());
    }

    #[test]
    fn test_open_bad_path_fails() {
        let result = FileDiskManager::open("/no/such/dir/data.db");
        assert!(matches!(result, Err(DiskError::Open { .. })));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let disk = FileDiskManager::open(dir.path().join("data.db")).unwrap();

        let mut page = [0u8; PAGE_SIZE];
        page[0..4].copy_from_slice(&[1, 2, 3, 4]);
        page[PAGE_SIZE - 1] = 0xFF;
        disk.write_page(PageId::new(3), &page);

        let mut out = [0u8; PAGE_SIZE];
        disk.read_page(PageId::new(3), &mut out);
        assert_eq!(out, page);
    }

    #[test]
    fn test_unwritten_page_reads_zeroes() {
        let dir = tempdir().unwrap();
        let disk = FileDiskManager::open(dir.path().join("data.db")).unwrap();

        let mut out = [0xAAu8; PAGE_SIZE];
        disk.read_page(PageId::new(9), &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.db");

        let mut page = [0u8; PAGE_SIZE];
        page[10] = 42;
        {
            let disk = FileDiskManager::open(&path).unwrap();
            disk.write_page(PageId::new(0), &page);
            disk.sync().unwrap();
        }

        let disk = FileDiskManager::open(&path).unwrap();
        let mut out = [0u8; PAGE_SIZE];
        disk.read_page(PageId::new(0), &mut out);
        assert_eq!(out[10], 42);
    }

    #[test]
    fn test_pages_do_not_overlap() {
        let dir = tempdir().unwrap();
        let disk = FileDiskManager::open(dir.path().join("data.db")).unwrap();

        let a = [0x11u8; PAGE_SIZE];
        let b = [0x22u8; PAGE_SIZE];
        disk.write_page(PageId::new(0), &a);
        disk.write_page(PageId::new(1), &b);

        let mut out = [0u8; PAGE_SIZE];
        disk.read_page(PageId::new(0), &mut out);
        assert_eq!(out, a);
        disk.read_page(PageId::new(1), &mut out);
        assert_eq!(out, b);
    }
}
