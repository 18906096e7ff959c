use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::disk_manager::DiskManager;
use crate::error::{BufferPoolError, Result};
use crate::page::{Frame, FrameId, PageId, PageRef};
use crate::replacer::{Replacer, ReplacerPolicy};

/// One buffer pool instance: a fixed set of frames plus the bookkeeping that
/// hands them out and reclaims them. Every frame is in exactly one of three
/// states at any time: free (on the free list), pinned (`pin_count > 0`,
/// indexed by the page table) or evictable (`pin_count == 0`, indexed and
/// tracked by the replacer).
///
/// All public operations run under one instance-wide mutex, so no partial
/// update is ever observable. Concurrency comes from running several
/// instances side by side (see `ShardedBufferPoolManager`).
pub struct BufferPoolManager {
    pool_size: usize,
    num_shards: usize,
    shard_index: usize,
    disk: Arc<DiskManager>,
    // only ever touched while `state` is held
    replacer: Box<dyn Replacer>,
    state: Mutex<PoolState>,
}

struct PoolState {
    frames: Vec<Frame>,
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    next_page_id: PageId,
}

impl BufferPoolManager {
    /// A standalone pool owning the full page id space.
    pub fn new(disk: Arc<DiskManager>, pool_size: usize) -> Self {
        Self::new_shard(disk, pool_size, 1, 0, ReplacerPolicy::Lru)
    }

    /// One shard of a sharded pool. The shard allocates only page ids with
    /// `page_id % num_shards == shard_index`, so ownership of an id never
    /// moves between shards.
    pub fn new_shard(
        disk: Arc<DiskManager>,
        pool_size: usize,
        num_shards: usize,
        shard_index: usize,
        policy: ReplacerPolicy,
    ) -> Self {
        assert!(pool_size > 0, "pool must hold at least one frame");
        assert!(num_shards > 0, "a pool has at least one shard");
        assert!(shard_index < num_shards, "shard index out of range");

        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list = (0..pool_size).collect();

        Self {
            pool_size,
            num_shards,
            shard_index,
            disk,
            replacer: policy.build(pool_size),
            state: Mutex::new(PoolState {
                frames,
                page_table: HashMap::new(),
                free_list,
                next_page_id: shard_index,
            }),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn shard_index(&self) -> usize {
        self.shard_index
    }

    /// Returns the requested page with one more pin on its frame, reading it
    /// from disk on a miss. Fails with `PoolExhausted` when the page is not
    /// resident and no free or evictable frame exists.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageRef> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.frames[frame_id].pin_count += 1;
            self.replacer.pin(frame_id);
            trace!("fetch hit: page {page_id} in frame {frame_id}");
            return Ok(PageRef::new(page_id, state.frames[frame_id].data()));
        }

        let frame_id = self.take_victim_frame(state)?;
        {
            let mut data = state.frames[frame_id].write();
            if let Err(err) = self.disk.read_page(page_id, data.as_mut_slice()) {
                drop(data);
                state.free_list.push_front(frame_id);
                return Err(err.into());
            }
        }
        let frame = &mut state.frames[frame_id];
        frame.page_id = Some(page_id);
        frame.pin_count = 1;
        frame.is_dirty = false;
        state.page_table.insert(page_id, frame_id);
        trace!("fetch miss: page {page_id} loaded into frame {frame_id}");
        Ok(PageRef::new(page_id, state.frames[frame_id].data()))
    }

    /// Allocates a fresh page id on this shard and pins a zeroed frame for
    /// it; the page is new data, so nothing is read from disk. Fails with
    /// `PoolExhausted` under the same condition as `fetch_page`.
    pub fn new_page(&self) -> Result<PageRef> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let frame_id = self.take_victim_frame(state)?;
        let page_id = self.allocate_page(state);

        state.frames[frame_id].write().fill(0);
        let frame = &mut state.frames[frame_id];
        frame.page_id = Some(page_id);
        frame.pin_count = 1;
        frame.is_dirty = false;
        state.page_table.insert(page_id, frame_id);
        debug!("allocated page {page_id} in frame {frame_id}");
        Ok(PageRef::new(page_id, state.frames[frame_id].data()))
    }

    /// Drops one pin on a resident page, ORing in the caller's dirty hint;
    /// the dirty bit is sticky until an explicit flush. The frame becomes
    /// evictable when its pin count reaches zero. Unpinning a page that is
    /// not resident or not pinned is a caller error and is reported as such.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let frame_id = *state
            .page_table
            .get(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;
        let frame = &mut state.frames[frame_id];
        if frame.pin_count == 0 {
            return Err(BufferPoolError::DoubleUnpin(page_id));
        }

        frame.pin_count -= 1;
        frame.is_dirty |= is_dirty;
        if frame.pin_count == 0 {
            self.replacer.mark_evictable(frame_id);
        }
        Ok(())
    }

    /// Writes the page to disk and clears its dirty flag, whether or not it
    /// was dirty. Idempotent once the page is resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let frame_id = *state
            .page_table
            .get(&page_id)
            .ok_or(BufferPoolError::PageNotFound(page_id))?;
        {
            let data = state.frames[frame_id].read();
            self.disk.write_page(page_id, data.as_slice())?;
        }
        state.frames[frame_id].is_dirty = false;
        trace!("flushed page {page_id}");
        Ok(())
    }

    /// Flushes every resident page; used at shutdown and checkpoints.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        for (&page_id, &frame_id) in &state.page_table {
            {
                let data = state.frames[frame_id].read();
                self.disk.write_page(page_id, data.as_slice())?;
            }
            state.frames[frame_id].is_dirty = false;
        }
        Ok(())
    }

    /// Removes a page from the pool, flushing it first if dirty, and returns
    /// its frame to the free list. Deleting a page that is not resident
    /// succeeds trivially; deleting a pinned page fails and changes nothing.
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };
        if state.frames[frame_id].pin_count > 0 {
            return Err(BufferPoolError::PagePinned(page_id));
        }
        if state.frames[frame_id].is_dirty {
            let data = state.frames[frame_id].read();
            self.disk.write_page(page_id, data.as_slice())?;
        }

        state.page_table.remove(&page_id);
        self.replacer.pin(frame_id);
        state.frames[frame_id].reset();
        state.free_list.push_back(frame_id);
        debug!("deleted page {page_id}, frame {frame_id} returned to free list");
        Ok(())
    }

    /// Frame acquisition shared by `fetch_page` and `new_page`: the free
    /// list always wins; the replacer is consulted only when it is empty. A
    /// dirty victim is written back and unindexed before the frame is handed
    /// out unassigned.
    fn take_victim_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self
            .replacer
            .victim()
            .ok_or(BufferPoolError::PoolExhausted)?;
        if let Some(old_page_id) = state.frames[frame_id].page_id {
            if state.frames[frame_id].is_dirty {
                debug!("writing back dirty page {old_page_id} before reusing frame {frame_id}");
                let data = state.frames[frame_id].read();
                self.disk.write_page(old_page_id, data.as_slice())?;
            }
            state.page_table.remove(&old_page_id);
        }
        let frame = &mut state.frames[frame_id];
        frame.page_id = None;
        frame.pin_count = 0;
        frame.is_dirty = false;
        Ok(frame_id)
    }

    fn allocate_page(&self, state: &mut PoolState) -> PageId {
        let page_id = state.next_page_id;
        state.next_page_id += self.num_shards;
        debug_assert_eq!(page_id % self.num_shards, self.shard_index);
        page_id
    }

    #[cfg(test)]
    pub(crate) fn is_resident(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Every frame must be exactly one of free, pinned or evictable, and the
    /// page table must agree with the frames it points at.
    #[cfg(test)]
    pub(crate) fn assert_partition_invariant(&self) {
        let state = self.state.lock();
        let free = state.free_list.len();
        let pinned = state.frames.iter().filter(|f| f.pin_count > 0).count();
        let evictable = self.replacer.size();

        assert_eq!(
            free + pinned + evictable,
            self.pool_size,
            "frame partition violated: free={free}, pinned={pinned}, evictable={evictable}, total={}",
            self.pool_size
        );
        for &frame_id in &state.free_list {
            assert_eq!(state.frames[frame_id].page_id, None);
            assert_eq!(state.frames[frame_id].pin_count, 0);
        }
        for (&page_id, &frame_id) in &state.page_table {
            assert_eq!(state.frames[frame_id].page_id, Some(page_id));
        }
    }
}
