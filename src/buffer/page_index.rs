//! Page index - maps resident pages to their frames.

use std::collections::HashMap;

use crate::common::{Error, FrameId, PageKey, Result};

/// `PageKey → FrameId` map for every resident page.
///
/// The manager keeps this mutually consistent with the frame table: an
/// entry exists iff the named frame is valid and holds that page. Misses
/// are `None`, not errors: "not cached" is the normal case, not an
/// exceptional one.
pub(crate) struct PageIndex {
    map: HashMap<PageKey, FrameId>,
}

impl PageIndex {
    /// Create an index sized for a pool of `capacity` frames.
    ///
    /// Sized at a small multiple of the frame count so lookups stay O(1)
    /// without rehashing: the map can never hold more entries than there
    /// are frames.
    pub(crate) fn with_frame_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity * 2),
        }
    }

    /// Register a new mapping.
    ///
    /// # Errors
    /// `DuplicateEntry` if the key is already present. The same page is
    /// never legitimately inserted twice, so callers propagate this as a
    /// definite failure.
    pub(crate) fn insert(&mut self, key: PageKey, frame_id: FrameId) -> Result<()> {
        if self.map.contains_key(&key) {
            return Err(Error::DuplicateEntry(key));
        }
        self.map.insert(key, frame_id);
        Ok(())
    }

    /// The frame holding the given page, if resident.
    #[inline]
    pub(crate) fn lookup(&self, key: PageKey) -> Option<FrameId> {
        self.map.get(&key).copied()
    }

    /// Remove a mapping, returning the frame it pointed at.
    ///
    /// `None` means the entry was already gone; callers that expect
    /// idempotence treat that as "already removed".
    #[inline]
    pub(crate) fn remove(&mut self, key: PageKey) -> Option<FrameId> {
        self.map.remove(&key)
    }

    /// Number of resident pages.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
