//! Error types for clockcache.

use crate::common::{FrameId, PageId, PageKey};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write
/// `Result<T>`, the same pattern as `std::io::Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in clockcache.
///
/// A single crate-wide enum keeps error handling consistent across the
/// buffer and storage layers. Page-index misses are *not* errors: lookups
/// return `Option` and the miss path is ordinary control flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from the underlying file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the file.
    #[error("page {0} not found")]
    PageNotFound(PageId),

    /// Eviction swept the whole pool without finding an unpinned frame.
    ///
    /// Every frame is pinned; the caller must unpin something before the
    /// pool can make progress. Definite failure, not a retry signal.
    #[error("buffer pool exceeded: every frame is pinned")]
    BufferExceeded,

    /// A page-index insert hit an existing entry.
    ///
    /// The same page is never legitimately inserted twice, so this
    /// indicates a logic error rather than a recoverable condition.
    #[error("{0} is already present in the page index")]
    DuplicateEntry(PageKey),

    /// Attempted to unpin a page whose pin count is already zero.
    ///
    /// Points at mismatched pin/unpin bookkeeping in the caller.
    #[error("page {page_no} of file '{file}' is not pinned")]
    PageNotPinned { file: String, page_no: PageId },

    /// A file-wide flush found one of the file's pages still pinned.
    ///
    /// The caller must unpin and retry; nothing was flushed or evicted.
    #[error("page {page_no} of file '{file}' is still pinned")]
    PagePinned { file: String, page_no: PageId },

    /// Frame metadata is internally inconsistent (a frame claims a file
    /// while marked invalid). Manager state is corrupt.
    #[error("{0} metadata is inconsistent")]
    BadBuffer(FrameId),
}
