//! File collaborator interface.
//!
//! The buffer pool does not know anything about on-disk layout: it talks
//! to files through the [`PageFile`] trait and keeps them as cheaply
//! clonable [`FileHandle`]s, so frame metadata can retain the owning file
//! for write-back at eviction and shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{FileId, PageId, Result};
use crate::storage::Page;

/// The file operations the buffer pool consumes.
///
/// Implementations own format, allocation bookkeeping, and raw I/O; the
/// buffer pool only reads and writes whole pages by number. A write issued
/// here is assumed to have taken effect before the pool reuses the frame.
#[cfg_attr(test, mockall::automock)]
pub trait PageFile: Send {
    /// Read the page with the given number.
    ///
    /// Fails with [`crate::Error::PageNotFound`] (or an I/O error) if the
    /// page does not exist.
    fn read_page(&mut self, page_no: PageId) -> Result<Page>;

    /// Persist `page` at the given page number.
    fn write_page(&mut self, page_no: PageId, page: &Page) -> Result<()>;

    /// Reserve a new page, returning its number and initial contents.
    fn allocate_page(&mut self) -> Result<(PageId, Page)>;

    /// Reclaim a page's on-disk slot.
    fn delete_page(&mut self, page_no: PageId) -> Result<()>;

    /// Name of the file, for identification and error messages.
    fn filename(&self) -> String;
}

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(0);

struct FileInner {
    id: FileId,
    name: String,
    io: Mutex<Box<dyn PageFile>>,
}

/// A registered page file.
///
/// Wrapping a [`PageFile`] assigns it a process-unique [`FileId`] (the
/// half of every page's identity that names the file) and serializes its
/// I/O behind a mutex. Handles are `Clone` and cheap to copy; the buffer
/// pool stores one per resident frame so eviction and drop-time flushing
/// can always reach the owning file.
#[derive(Clone)]
pub struct FileHandle {
    inner: Arc<FileInner>,
}

impl FileHandle {
    /// Register a file, assigning it a fresh id.
    pub fn new<F: PageFile + 'static>(file: F) -> Self {
        let name = file.filename();
        Self {
            inner: Arc::new(FileInner {
                id: FileId::new(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)),
                name,
                io: Mutex::new(Box::new(file)),
            }),
        }
    }

    /// The process-unique id of this file.
    #[inline]
    pub fn id(&self) -> FileId {
        self.inner.id
    }

    /// The file's name, captured at registration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Read a page from the file.
    pub fn read_page(&self, page_no: PageId) -> Result<Page> {
        self.inner.io.lock().read_page(page_no)
    }

    /// Write a page to the file.
    pub fn write_page(&self, page_no: PageId, page: &Page) -> Result<()> {
        self.inner.io.lock().write_page(page_no, page)
    }

    /// Reserve a new page in the file.
    pub fn allocate_page(&self) -> Result<(PageId, Page)> {
        self.inner.io.lock().allocate_page()
    }

    /// Reclaim a page of the file.
    pub fn delete_page(&self, page_no: PageId) -> Result<()> {
        self.inner.io.lock().delete_page(page_no)
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}
