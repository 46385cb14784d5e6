//! clockcache - a clock-eviction buffer pool for page-oriented storage
//! engines.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     storage engine (caller)               │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               ↓
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Buffer Pool (buffer/)                     │
//! │   BufferManager ── PageIndex ── FrameDescriptors          │
//! │        │                │            │                    │
//! │   ClockReplacer ────────┴──── PagePool (one 4KB slot      │
//! │   (second chance)             per frame)                  │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               ↓
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Storage Layer (storage/)                  │
//! │   PageFile trait ← FileHandle registration ← DiskFile     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are identified by (file, page number); any number of files can
//! share one pool. Callers pin pages to keep them resident, report
//! writes when unpinning, and the pool writes dirty pages back at
//! eviction, file flush, and shutdown.
//!
//! # Modules
//! - [`common`] - Shared primitives (ids, error type, config)
//! - [`buffer`] - Buffer pool management and eviction
//! - [`storage`] - The file collaborator seam and page container
//!
//! # Quick Start
//! ```no_run
//! use clockcache::{BufferManager, DiskFile, FileHandle};
//!
//! let file = FileHandle::new(DiskFile::create("my_database.db").unwrap());
//! let pool = BufferManager::new(64);
//!
//! let page = pool.alloc_page(&file).unwrap();
//! page.write().as_mut_slice()[0] = 0xAB;
//! pool.unpin_page(&file, page.page_no(), true).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, PageKey, Result};

pub use buffer::{BufferManager, BufferStats, FrameInfo, PinnedPage, PoolDump, StatsSnapshot};
pub use storage::{DiskFile, FileHandle, Page, PageFile};
