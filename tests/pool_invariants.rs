//! Property test: random operation sequences keep the pool consistent.
//!
//! After every operation the frame table and page index must agree
//! (every valid frame is indexed, nothing else is) and failures must be
//! the documented kinds in the documented situations.

use clockcache::{BufferManager, DiskFile, Error, FileHandle, PageId};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const CAPACITY: usize = 3;
const PAGES: u32 = 8;

#[derive(Debug, Clone)]
enum Op {
    Read(u32),
    Unpin { page: u32, dirty: bool },
    Alloc,
    Dispose(u32),
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..PAGES).prop_map(Op::Read),
        4 => ((0..PAGES), any::<bool>()).prop_map(|(page, dirty)| Op::Unpin { page, dirty }),
        1 => Just(Op::Alloc),
        1 => (0..PAGES).prop_map(Op::Dispose),
        1 => Just(Op::Flush),
    ]
}

fn seeded_pool(dir: &tempfile::TempDir) -> (BufferManager, FileHandle) {
    let f = FileHandle::new(DiskFile::create(dir.path().join("prop.db")).unwrap());
    for _ in 0..PAGES {
        let (page_no, page) = f.allocate_page().unwrap();
        f.write_page(page_no, &page).unwrap();
    }
    (BufferManager::new(CAPACITY), f)
}

/// The structural invariants that must hold between any two operations.
fn check_consistent(pool: &BufferManager, f: &FileHandle) -> Result<(), TestCaseError> {
    let dump = pool.dump();

    // Valid frames and index entries correspond one to one.
    prop_assert_eq!(dump.valid_frames, pool.resident_page_count());

    let mut seen = std::collections::HashSet::new();
    for info in dump.frames.iter().filter(|i| i.valid) {
        // Each valid frame's page is findable through the index.
        prop_assert_eq!(pool.pin_count(f, info.page_no), Some(info.pin_count));
        // No page occupies two frames.
        prop_assert!(seen.insert(info.page_no));
        // Validity always comes with an owning file.
        prop_assert!(info.file.is_some());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pool_stays_consistent(ops in proptest::collection::vec(op_strategy(), 1..80)) {
        let dir = tempfile::tempdir().unwrap();
        let (pool, f) = seeded_pool(&dir);

        for op in ops {
            match op {
                Op::Read(page) => {
                    match pool.read_page(&f, PageId::new(page)) {
                        Ok(_) => {}
                        Err(Error::BufferExceeded) => {
                            // Only legal when every frame is pinned.
                            let dump = pool.dump();
                            prop_assert!(dump.frames.iter().all(|i| i.valid && i.pin_count > 0));
                        }
                        // A previously disposed page is gone from disk.
                        Err(Error::PageNotFound(_)) => {}
                        Err(e) => prop_assert!(false, "unexpected read error: {e}"),
                    }
                }
                Op::Unpin { page, dirty } => {
                    let before = pool.pin_count(&f, PageId::new(page));
                    match pool.unpin_page(&f, PageId::new(page), dirty) {
                        Ok(()) => {}
                        Err(Error::PageNotPinned { .. }) => {
                            // Resident, but pin count was already zero, and stays there.
                            prop_assert_eq!(before, Some(0));
                            prop_assert_eq!(pool.pin_count(&f, PageId::new(page)), Some(0));
                        }
                        Err(e) => prop_assert!(false, "unexpected unpin error: {e}"),
                    }
                }
                Op::Alloc => {
                    match pool.alloc_page(&f) {
                        Ok(p) => {
                            let no = p.page_no();
                            pool.unpin_page(&f, no, false).unwrap();
                        }
                        Err(Error::BufferExceeded) => {
                            let dump = pool.dump();
                            prop_assert!(dump.frames.iter().all(|i| i.valid && i.pin_count > 0));
                        }
                        Err(e) => prop_assert!(false, "unexpected alloc error: {e}"),
                    }
                }
                Op::Dispose(page) => {
                    match pool.dispose_page(&f, PageId::new(page)) {
                        Ok(()) => {
                            prop_assert_eq!(pool.pin_count(&f, PageId::new(page)), None);
                        }
                        // Already reclaimed on disk.
                        Err(Error::PageNotFound(_)) => {}
                        Err(e) => prop_assert!(false, "unexpected dispose error: {e}"),
                    }
                }
                Op::Flush => {
                    match pool.flush_file(&f) {
                        Ok(()) => {
                            prop_assert_eq!(pool.resident_page_count(), 0);
                        }
                        Err(Error::PagePinned { .. }) => {
                            let dump = pool.dump();
                            prop_assert!(dump.frames.iter().any(|i| i.valid && i.pin_count > 0));
                        }
                        Err(e) => prop_assert!(false, "unexpected flush error: {e}"),
                    }
                }
            }

            check_consistent(&pool, &f)?;
        }
    }
}
