//! Buffer manager - the page caching facade.
//!
//! The [`BufferManager`] coordinates the frame table, page index, page
//! pool, and clock replacer behind the public operations the storage
//! engine consumes:
//! - Page caching between files and memory, keyed by (file, page number)
//! - Pin-based residency tracking with explicit unpin
//! - Dirty-page write-back on eviction, file flush, and shutdown

use std::fmt;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::buffer::frame::FrameDescriptor;
use crate::buffer::page_index::PageIndex;
use crate::buffer::page_pool::PagePool;
use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferStats, PinnedPage};
use crate::common::{Error, FrameId, PageId, PageKey, Result};
use crate::storage::FileHandle;

/// Everything that must stay mutually consistent: the frame table, the
/// page index, and the clock hand. One lock over the triple makes
/// "insert into index + mark frame valid" and "remove from index +
/// invalidate frame" atomic units.
struct Core {
    frames: Vec<FrameDescriptor>,
    index: PageIndex,
    clock: ClockReplacer,
}

/// Caches pages of any number of files in a fixed pool of frames.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                       BufferManager                          │
/// │  core: Mutex ───────────────────────────────┐                │
/// │  │ ┌───────────────┐  ┌────────────────────┐│ ┌────────────┐ │
/// │  │ │ index         │  │ frames:            ││ │ pool       │ │
/// │  │ │ PageKey → Fid │─▶│ Vec<FrameDescriptor>││ │ RwLock<Page>│ │
/// │  │ └───────────────┘  └────────────────────┘│ │ per frame  │ │
/// │  │ ┌───────────────┐                        │ └────────────┘ │
/// │  │ │ clock (hand)  │                        │ ┌────────────┐ │
/// │  │ └───────────────┘                        │ │ stats      │ │
/// │  └─────────────────────────────────────────┘  └────────────┘ │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `core`: one `Mutex` over frame table + index + clock; metadata
///   changes are short and serialized per operation
/// - `pool`: no pool-wide lock; each frame's bytes behind their own
///   `RwLock`, reachable through [`PinnedPage`] without touching `core`
/// - `stats`: atomic counters
///
/// File I/O happens through [`FileHandle`]s, which serialize per file.
///
/// # Usage
/// ```ignore
/// let file = FileHandle::new(DiskFile::create("data.db")?);
/// let bm = BufferManager::new(64);
///
/// let page = bm.alloc_page(&file)?;
/// page.write().as_mut_slice()[0] = 0xAB;
/// bm.unpin_page(&file, page.page_no(), true)?;
/// ```
pub struct BufferManager {
    /// Raw page storage, one slot per frame.
    pool: PagePool,

    /// Frame table, page index, and clock hand.
    core: Mutex<Core>,

    /// Performance counters.
    stats: BufferStats,
}

impl BufferManager {
    /// Create a buffer manager with `capacity` frames.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            pool: PagePool::new(capacity),
            core: Mutex::new(Core {
                frames: (0..capacity)
                    .map(|i| FrameDescriptor::new(FrameId::new(i)))
                    .collect(),
                index: PageIndex::with_frame_capacity(capacity),
                clock: ClockReplacer::new(capacity),
            }),
            stats: BufferStats::new(),
        }
    }

    // ========================================================================
    // Public API: page access
    // ========================================================================

    /// Fetch a page, pinning it.
    ///
    /// A resident page is returned directly with its reference bit set.
    /// Otherwise a frame is claimed (evicting if necessary, writing back
    /// a dirty victim first) and the page is loaded from the file.
    ///
    /// Every successful call adds one pin; the caller owes a matching
    /// [`unpin_page`](Self::unpin_page).
    ///
    /// # Errors
    /// - [`Error::BufferExceeded`] if every frame is pinned
    /// - [`Error::PageNotFound`] / [`Error::Io`] from the file
    pub fn read_page(&self, file: &FileHandle, page_no: PageId) -> Result<PinnedPage<'_>> {
        let key = PageKey::new(file.id(), page_no);
        let mut core = self.core.lock();

        if let Some(frame_id) = core.index.lookup(key) {
            let desc = &mut core.frames[frame_id.0];
            desc.ref_bit = true;
            desc.pin_count += 1;
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(self.pinned(frame_id, page_no));
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let frame_id = self.take_frame(&mut core)?;
        let page = file.read_page(page_no)?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        *self.pool.slot(frame_id).write() = page;
        core.index.insert(key, frame_id)?;
        core.frames[frame_id.0].assign(file.clone(), page_no);

        Ok(self.pinned(frame_id, page_no))
    }

    /// Release one pin on a page.
    ///
    /// `is_dirty` reports whether the caller wrote the page; it can only
    /// set the dirty flag, never clear it (flushing clears it). Unpinning
    /// a page that is not resident is a tolerated no-op: the page may
    /// have been disposed or flushed away already.
    ///
    /// # Errors
    /// [`Error::PageNotPinned`] if the page is resident with a pin count
    /// of zero; state is left unchanged.
    pub fn unpin_page(&self, file: &FileHandle, page_no: PageId, is_dirty: bool) -> Result<()> {
        let key = PageKey::new(file.id(), page_no);
        let mut core = self.core.lock();

        let Some(frame_id) = core.index.lookup(key) else {
            return Ok(());
        };

        let desc = &mut core.frames[frame_id.0];
        if desc.pin_count == 0 {
            return Err(Error::PageNotPinned {
                file: file.name().to_string(),
                page_no,
            });
        }

        desc.pin_count -= 1;
        if is_dirty {
            desc.dirty = true;
        }
        Ok(())
    }

    /// Reserve a new page in `file` and pin it.
    ///
    /// The file picks the page number; it travels on the returned handle
    /// ([`PinnedPage::page_no`]). The caller owes an unpin.
    ///
    /// # Errors
    /// - [`Error::BufferExceeded`] if every frame is pinned
    /// - [`Error::Io`] from the file's allocation
    pub fn alloc_page(&self, file: &FileHandle) -> Result<PinnedPage<'_>> {
        let mut core = self.core.lock();

        let frame_id = self.take_frame(&mut core)?;
        let (page_no, page) = file.allocate_page()?;

        *self.pool.slot(frame_id).write() = page;
        core.index
            .insert(PageKey::new(file.id(), page_no), frame_id)?;
        core.frames[frame_id.0].assign(file.clone(), page_no);

        Ok(self.pinned(frame_id, page_no))
    }

    /// Drop a page entirely: its residency, then its on-disk slot.
    ///
    /// Residency is dropped regardless of pin state: disposal is an
    /// explicit request from a caller that must guarantee no outstanding
    /// references itself. A page that is not resident only has its
    /// on-disk slot reclaimed.
    pub fn dispose_page(&self, file: &FileHandle, page_no: PageId) -> Result<()> {
        let key = PageKey::new(file.id(), page_no);
        {
            let mut core = self.core.lock();
            if let Some(frame_id) = core.index.remove(key) {
                let desc = &mut core.frames[frame_id.0];
                if desc.is_pinned() {
                    log::warn!("disposing {key} while pinned {} times", desc.pin_count);
                }
                desc.reset();
            }
        }
        file.delete_page(page_no)
    }

    /// Write back and evict every resident page of `file`.
    ///
    /// Used before a file is closed, so no stale resident pages remain.
    /// Validation runs first: if any of the file's pages is still pinned,
    /// or a frame claims the file while marked invalid, the operation
    /// fails with the frame table and index untouched.
    ///
    /// # Errors
    /// - [`Error::PagePinned`]: unpin and retry
    /// - [`Error::BadBuffer`]: manager state is corrupt
    /// - [`Error::Io`] from write-back
    pub fn flush_file(&self, file: &FileHandle) -> Result<()> {
        let mut core = self.core.lock();

        for desc in core.frames.iter() {
            let Some(f) = desc.file.as_ref() else { continue };
            if f.id() != file.id() {
                continue;
            }
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    file: file.name().to_string(),
                    page_no: desc.page_no,
                });
            }
            if !desc.valid {
                return Err(Error::BadBuffer(desc.frame_id));
            }
        }

        for i in 0..core.frames.len() {
            let (frame_id, page_no, dirty) = {
                let desc = &core.frames[i];
                match desc.file.as_ref() {
                    Some(f) if f.id() == file.id() => (desc.frame_id, desc.page_no, desc.dirty),
                    _ => continue,
                }
            };

            if dirty {
                let page = self.pool.slot(frame_id).read();
                file.write_page(page_no, &page)?;
                drop(page);
                core.frames[i].dirty = false;
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            }

            core.index.remove(PageKey::new(file.id(), page_no));
            core.frames[i].reset();
        }

        Ok(())
    }

    // ========================================================================
    // Public API: diagnostics
    // ========================================================================

    /// Buffer pool counters.
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of pages currently resident.
    pub fn resident_page_count(&self) -> usize {
        self.core.lock().index.len()
    }

    /// Pin count of a page, or `None` if it is not resident.
    pub fn pin_count(&self, file: &FileHandle, page_no: PageId) -> Option<u32> {
        let core = self.core.lock();
        core.index
            .lookup(PageKey::new(file.id(), page_no))
            .map(|frame_id| core.frames[frame_id.0].pin_count)
    }

    /// A point-in-time listing of every frame descriptor.
    pub fn dump(&self) -> PoolDump {
        let core = self.core.lock();
        let frames: Vec<FrameInfo> = core
            .frames
            .iter()
            .map(|desc| FrameInfo {
                frame_id: desc.frame_id,
                valid: desc.valid,
                file: desc.file.as_ref().map(|f| f.name().to_string()),
                page_no: desc.page_no,
                pin_count: desc.pin_count,
                dirty: desc.dirty,
                ref_bit: desc.ref_bit,
            })
            .collect();
        let valid_frames = frames.iter().filter(|f| f.valid).count();
        PoolDump {
            frames,
            valid_frames,
        }
    }

    // ========================================================================
    // Internal: frame claiming and eviction
    // ========================================================================

    /// Claim a frame for a new page, evicting the clock's victim.
    fn take_frame(&self, core: &mut Core) -> Result<FrameId> {
        let frame_id = core.clock.pick_victim(&mut core.frames)?;
        self.evict_victim(core, frame_id)?;
        Ok(frame_id)
    }

    /// Tear down a victim frame: write back if dirty, drop its index
    /// entry, reset the descriptor. Flush strictly precedes index
    /// removal. On write-back failure the frame stays resident and
    /// indexed and the operation fails, with nothing half-evicted.
    fn evict_victim(&self, core: &mut Core, frame_id: FrameId) -> Result<()> {
        let key = {
            let desc = &mut core.frames[frame_id.0];
            if !desc.valid {
                desc.reset();
                return Ok(());
            }
            let file = desc.file.clone().ok_or(Error::BadBuffer(frame_id))?;

            if desc.dirty {
                let page = self.pool.slot(frame_id).read();
                file.write_page(desc.page_no, &page)?;
                drop(page);
                desc.dirty = false;
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            }
            PageKey::new(file.id(), desc.page_no)
        };

        log::debug!("evicting {key} from {frame_id}");
        core.index.remove(key);
        core.frames[frame_id.0].reset();
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn pinned(&self, frame_id: FrameId, page_no: PageId) -> PinnedPage<'_> {
        PinnedPage::new(self.pool.slot(frame_id), frame_id, page_no)
    }
}

impl Drop for BufferManager {
    /// Write every dirty resident page back to its owning file.
    ///
    /// Failures are logged, not propagated; there is nowhere left to
    /// propagate them to.
    fn drop(&mut self) {
        let core = self.core.get_mut();
        for desc in core.frames.iter_mut() {
            if !(desc.valid && desc.dirty) {
                continue;
            }
            let Some(file) = desc.file.as_ref() else {
                continue;
            };
            let page = self.pool.slot(desc.frame_id).read();
            match file.write_page(desc.page_no, &page) {
                Ok(()) => {
                    desc.dirty = false;
                    self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    log::error!(
                        "write-back of {}:{} failed during shutdown: {e}",
                        file.name(),
                        desc.page_no
                    );
                }
            }
        }
    }
}

/// One frame's metadata as seen by [`BufferManager::dump`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    pub valid: bool,
    /// Name of the owning file, when one is recorded.
    pub file: Option<String>,
    pub page_no: PageId,
    pub pin_count: u32,
    pub dirty: bool,
    pub ref_bit: bool,
}

/// Listing of every frame descriptor plus a valid-frame count.
#[derive(Debug, Clone)]
pub struct PoolDump {
    pub frames: Vec<FrameInfo>,
    pub valid_frames: usize,
}

impl fmt::Display for PoolDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for info in &self.frames {
            if info.valid {
                writeln!(
                    f,
                    "{}: {} {} pin={}{}{}",
                    info.frame_id,
                    info.file.as_deref().unwrap_or("?"),
                    info.page_no,
                    info.pin_count,
                    if info.dirty { " dirty" } else { "" },
                    if info.ref_bit { " ref" } else { "" },
                )?;
            } else {
                writeln!(f, "{}: empty", info.frame_id)?;
            }
        }
        write!(f, "valid frames: {}", self.valid_frames)
    }
}
