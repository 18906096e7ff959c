use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type PageId = usize;
pub type FrameId = usize;

/// Page size shared with the disk manager.
pub const PAGE_SIZE: usize = 4096;

/// An in-memory slot holding one page's bytes plus its bookkeeping. Frames
/// are owned by a single buffer pool instance for its whole lifetime; only
/// their contents get reassigned. The metadata fields are mutated exclusively
/// under the owning instance's lock.
pub(crate) struct Frame {
    pub(crate) page_id: Option<PageId>,
    pub(crate) pin_count: usize,
    pub(crate) is_dirty: bool,
    data: Arc<RwLock<Vec<u8>>>,
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self {
            page_id: None,
            pin_count: 0,
            is_dirty: false,
            data: Arc::new(RwLock::new(vec![0; PAGE_SIZE])),
        }
    }

    pub(crate) fn data(&self) -> Arc<RwLock<Vec<u8>>> {
        Arc::clone(&self.data)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.data.write()
    }

    /// Returns the frame to its unassigned state and zeroes the buffer.
    pub(crate) fn reset(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
        self.data.write().fill(0);
    }
}

/// The caller's view of a cached page, handed out by `fetch_page` and
/// `new_page`. Valid until the matching `unpin_page`; holding one past that
/// point is a caller-contract violation the pool does not defend against.
#[derive(Clone, Debug)]
pub struct PageRef {
    page_id: PageId,
    data: Arc<RwLock<Vec<u8>>>,
}

impl PageRef {
    pub(crate) fn new(page_id: PageId, data: Arc<RwLock<Vec<u8>>>) -> Self {
        Self { page_id, data }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.data.write()
    }
}
