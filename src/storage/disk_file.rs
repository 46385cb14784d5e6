//! DiskFile - a single-file page store.
//!
//! The simplest useful [`PageFile`]: pages laid out sequentially in one
//! OS file, write-through on every write. Deleted pages are remembered in
//! an in-memory free set and handed back out by `allocate_page` before
//! the file grows.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::file::PageFile;
use crate::storage::Page;

/// Page-per-offset storage over a single OS file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N lives at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskFile` is single-threaded; [`super::FileHandle`] serializes access
/// when one is shared.
///
/// # Durability
/// All writes are followed by `fsync()`. Conservative, but this layer has
/// no log to recover from.
///
/// The free set is in-memory only: slots reclaimed by `delete_page` are
/// reused within one session and simply remain allocated after reopen.
/// The layout is not a stable format.
pub struct DiskFile {
    file: File,
    name: String,
    /// Number of pages the file spans, including freed ones.
    page_count: u32,
    /// Page numbers reclaimed by `delete_page`, reused lowest-first.
    free: BTreeSet<u32>,
}

impl DiskFile {
    /// Create a new file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count: 0,
            free: BTreeSet::new(),
        })
    }

    /// Open an existing file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Page count follows from the file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count,
            free: BTreeSet::new(),
        })
    }

    /// Open an existing file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Number of pages the file spans.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    fn offset(page_no: PageId) -> u64 {
        (page_no.0 as u64) * (PAGE_SIZE as u64)
    }

    fn check_exists(&self, page_no: PageId) -> Result<()> {
        if page_no.0 >= self.page_count || self.free.contains(&page_no.0) {
            return Err(Error::PageNotFound(page_no));
        }
        Ok(())
    }
}

impl PageFile for DiskFile {
    fn read_page(&mut self, page_no: PageId) -> Result<Page> {
        self.check_exists(page_no)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    fn write_page(&mut self, page_no: PageId, page: &Page) -> Result<()> {
        self.check_exists(page_no)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    fn allocate_page(&mut self) -> Result<(PageId, Page)> {
        // Reuse the lowest reclaimed slot before growing the file
        let page_no = match self.free.iter().next().copied() {
            Some(no) => {
                self.free.remove(&no);
                PageId::new(no)
            }
            None => {
                let no = PageId::new(self.page_count);
                self.page_count += 1;
                no
            }
        };

        let zeros = Page::new();
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(zeros.as_slice())?;
        self.file.sync_all()?;

        Ok((page_no, zeros))
    }

    fn delete_page(&mut self, page_no: PageId) -> Result<()> {
        // A freed or out-of-range page cannot be freed again
        self.check_exists(page_no)?;
        self.free.insert(page_no.0);
        Ok(())
    }

    fn filename(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let df = DiskFile::create(&path).unwrap();
        assert_eq!(df.page_count(), 0);
        assert!(df.filename().ends_with("test.db"));
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskFile::create(&path).unwrap();
        assert!(DiskFile::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        assert!(DiskFile::open(dir.path().join("nonexistent.db")).is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let (page_no, page) = df.allocate_page().unwrap();
        assert_eq!(page_no, PageId::new(0));
        assert_eq!(df.page_count(), 1);
        assert_eq!(page.as_slice()[0], 0);

        // Fresh page reads back as zeros
        let page = df.read_page(page_no).unwrap();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();
        let (page_no, mut page) = df.allocate_page().unwrap();

        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[4095] = 0xEF;

        df.write_page(page_no, &page).unwrap();

        let read_back = df.read_page(page_no).unwrap();
        assert_eq!(read_back.as_slice()[0], 0xAB);
        assert_eq!(read_back.as_slice()[100], 0xCD);
        assert_eq!(read_back.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut df = DiskFile::create(&path).unwrap();
            let (page_no, mut page) = df.allocate_page().unwrap();
            page.as_mut_slice()[0] = 0x42;
            df.write_page(page_no, &page).unwrap();
        }

        {
            let mut df = DiskFile::open(&path).unwrap();
            assert_eq!(df.page_count(), 1);

            let page = df.read_page(PageId::new(0)).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_delete_and_reuse_page() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let (p0, _) = df.allocate_page().unwrap();
        let (p1, _) = df.allocate_page().unwrap();
        assert_eq!(df.page_count(), 2);

        df.delete_page(p0).unwrap();

        // Reclaimed slot comes back first, zeroed, without growing the file
        let (reused, page) = df.allocate_page().unwrap();
        assert_eq!(reused, p0);
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(df.page_count(), 2);

        // p1 was untouched
        assert!(df.read_page(p1).is_ok());
    }

    #[test]
    fn test_freed_page_rejects_io() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let (p0, page) = df.allocate_page().unwrap();
        df.delete_page(p0).unwrap();

        assert!(matches!(df.read_page(p0), Err(Error::PageNotFound(_))));
        assert!(matches!(
            df.write_page(p0, &page),
            Err(Error::PageNotFound(_))
        ));
    }

    #[test]
    fn test_double_delete_fails() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let (p0, _) = df.allocate_page().unwrap();
        df.delete_page(p0).unwrap();
        assert!(df.delete_page(p0).is_err());
    }

    #[test]
    fn test_read_out_of_bounds() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();
        df.allocate_page().unwrap();

        let result = df.read_page(PageId::new(1));
        assert!(matches!(result, Err(Error::PageNotFound(_))));
    }

    #[test]
    fn test_write_out_of_bounds() {
        let dir = tempdir().unwrap();
        let mut df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let page = Page::new();
        assert!(df.write_page(PageId::new(0), &page).is_err());
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut df = DiskFile::open_or_create(&path).unwrap();
            assert_eq!(df.page_count(), 0);
            df.allocate_page().unwrap();
        }

        {
            let df = DiskFile::open_or_create(&path).unwrap();
            assert_eq!(df.page_count(), 1);
        }
    }
}
