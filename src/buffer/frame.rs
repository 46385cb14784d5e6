//! Frame descriptors - per-frame metadata for the buffer pool.
//!
//! One [`FrameDescriptor`] per frame, array-indexed by frame id. The
//! descriptor records which page the frame holds (if any), how many
//! callers have it pinned, whether its bytes differ from disk, and the
//! reference bit the clock scan uses to approximate recency.

use crate::common::{FrameId, PageId, PageKey};
use crate::storage::FileHandle;

/// Metadata for one frame of the buffer pool.
///
/// Plain fields: every read and write happens under the manager's
/// metadata lock, which is what makes index updates and descriptor
/// updates atomic as a unit.
///
/// `file` and `valid` are tracked separately: a descriptor that names a
/// file while `valid` is false is a corrupt state the manager detects
/// and reports.
#[derive(Debug)]
pub(crate) struct FrameDescriptor {
    /// Fixed at pool construction, never changes.
    pub(crate) frame_id: FrameId,
    /// Whether the frame currently holds a resident page.
    pub(crate) valid: bool,
    /// Owning file of the resident page.
    pub(crate) file: Option<FileHandle>,
    /// Page number within the owning file.
    pub(crate) page_no: PageId,
    /// Outstanding holders requiring the page to stay resident.
    pub(crate) pin_count: u32,
    /// True iff the in-memory bytes differ from disk.
    pub(crate) dirty: bool,
    /// Set on access, cleared by the clock hand passing over.
    pub(crate) ref_bit: bool,
}

impl FrameDescriptor {
    /// Create an empty descriptor for the given frame.
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            valid: false,
            file: None,
            page_no: PageId::INVALID,
            pin_count: 0,
            dirty: false,
            ref_bit: false,
        }
    }

    /// Install a freshly loaded page: valid, pinned once, referenced,
    /// clean.
    pub(crate) fn assign(&mut self, file: FileHandle, page_no: PageId) {
        self.valid = true;
        self.file = Some(file);
        self.page_no = page_no;
        self.pin_count = 1;
        self.dirty = false;
        self.ref_bit = true;
    }

    /// Return the descriptor to the empty state.
    pub(crate) fn reset(&mut self) {
        self.valid = false;
        self.file = None;
        self.page_no = PageId::INVALID;
        self.pin_count = 0;
        self.dirty = false;
        self.ref_bit = false;
    }

    /// The page-index key of the resident page, if a file is recorded.
    pub(crate) fn key(&self) -> Option<PageKey> {
        self.file
            .as_ref()
            .map(|f| PageKey::new(f.id(), self.page_no))
    }

    /// Whether any caller currently holds the page.
    #[inline]
    pub(crate) fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }
}
