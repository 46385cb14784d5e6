//! Raw page storage for the buffer pool.

use parking_lot::RwLock;

use crate::common::FrameId;
use crate::storage::Page;

/// One page-sized slot per frame, allocated once and reused in place.
///
/// Pure storage: no policy, no metadata. Each slot carries its own
/// `RwLock` so callers can read and write a pinned page's bytes without
/// touching the manager's metadata lock. Whether a slot's contents mean
/// anything is the frame table's business.
pub(crate) struct PagePool {
    slots: Vec<RwLock<Page>>,
}

impl PagePool {
    /// Allocate `capacity` zeroed slots.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| RwLock::new(Page::new())).collect(),
        }
    }

    /// The slot backing the given frame.
    #[inline]
    pub(crate) fn slot(&self, frame_id: FrameId) -> &RwLock<Page> {
        &self.slots[frame_id.0]
    }

    /// Number of slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
