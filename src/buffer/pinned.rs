//! Handle for accessing a pinned page's bytes.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::Page;

/// A pinned page, as returned by [`read_page`] and [`alloc_page`].
///
/// The handle names the page and grants access to the bytes of the frame
/// holding it. It does **not** unpin on drop: unpinning is the explicit
/// [`unpin_page`] operation, where the caller also reports whether it
/// wrote the page.
///
/// The pool guarantees residency only while the pin is held. Using a
/// handle after unpinning its page is memory-safe but may observe a
/// recycled frame whose contents belong to some other page. Byte-level
/// coordination between concurrent users of the same pinned page is the
/// caller's responsibility; the per-frame lock only keeps individual
/// reads and writes whole.
///
/// [`read_page`]: crate::buffer::BufferManager::read_page
/// [`alloc_page`]: crate::buffer::BufferManager::alloc_page
/// [`unpin_page`]: crate::buffer::BufferManager::unpin_page
pub struct PinnedPage<'a> {
    /// Storage slot of the frame holding this page.
    slot: &'a RwLock<Page>,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Page number within the owning file.
    page_no: PageId,
}

impl std::fmt::Debug for PinnedPage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedPage")
            .field("frame_id", &self.frame_id)
            .field("page_no", &self.page_no)
            .finish_non_exhaustive()
    }
}

impl<'a> PinnedPage<'a> {
    pub(crate) fn new(slot: &'a RwLock<Page>, frame_id: FrameId, page_no: PageId) -> Self {
        Self {
            slot,
            frame_id,
            page_no,
        }
    }

    /// The page number within its file.
    #[inline]
    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    /// The frame currently holding the page.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Acquire shared access to the page bytes.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'a, Page> {
        self.slot.read()
    }

    /// Acquire exclusive access to the page bytes.
    ///
    /// Writing through this guard does not mark the page dirty; report
    /// the write when unpinning.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'a, Page> {
        self.slot.write()
    }
}
