use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::buffer_pool_manager::BufferPoolManager;
use crate::disk_manager::DiskManager;
use crate::error::{BufferPoolError, Result};
use crate::page::{PageId, PageRef};
use crate::replacer::ReplacerPolicy;

/// Construction-time settings for a sharded buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolOptions {
    /// Frames per shard.
    pub pool_size: usize,
    /// Parallelism degree; a page is owned by shard `page_id % num_shards`.
    pub num_shards: usize,
    /// Eviction policy used by every shard.
    pub replacer: ReplacerPolicy,
}

impl Default for BufferPoolOptions {
    fn default() -> Self {
        Self {
            pool_size: 64,
            num_shards: 1,
            replacer: ReplacerPolicy::Lru,
        }
    }
}

/// One logical buffer pool over N independent instances. Page ids are
/// striped across shards at allocation time, so routing is a pure function
/// of the id and operations on pages owned by different shards never
/// contend on a lock.
pub struct ShardedBufferPoolManager {
    shards: Vec<BufferPoolManager>,
    // round-robin starting point for new_page
    cursor: AtomicUsize,
}

impl ShardedBufferPoolManager {
    pub fn new(disk: Arc<DiskManager>, options: BufferPoolOptions) -> Self {
        assert!(options.num_shards > 0, "a pool has at least one shard");

        let shards = (0..options.num_shards)
            .map(|shard_index| {
                BufferPoolManager::new_shard(
                    Arc::clone(&disk),
                    options.pool_size,
                    options.num_shards,
                    shard_index,
                    options.replacer,
                )
            })
            .collect();

        Self {
            shards,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Total frames across all shards.
    pub fn pool_size(&self) -> usize {
        self.shards.iter().map(BufferPoolManager::pool_size).sum()
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    fn route(&self, page_id: PageId) -> &BufferPoolManager {
        &self.shards[page_id % self.shards.len()]
    }

    pub fn fetch_page(&self, page_id: PageId) -> Result<PageRef> {
        self.route(page_id).fetch_page(page_id)
    }

    /// Allocates a new page on some shard, scanning round-robin from a
    /// rotating cursor. The cursor advances once per scanned shard, so a
    /// shard that keeps failing does not pin the rotation in place. Fails
    /// only when every shard reports exhaustion.
    pub fn new_page(&self) -> Result<PageRef> {
        for _ in 0..self.shards.len() {
            let shard = self.cursor.fetch_add(1, Ordering::Relaxed) % self.shards.len();
            match self.shards[shard].new_page() {
                Ok(page) => return Ok(page),
                Err(BufferPoolError::PoolExhausted) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(BufferPoolError::PoolExhausted)
    }

    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        self.route(page_id).unpin_page(page_id, is_dirty)
    }

    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        self.route(page_id).flush_page(page_id)
    }

    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        self.route(page_id).delete_page(page_id)
    }

    pub fn flush_all_pages(&self) -> Result<()> {
        for shard in &self.shards {
            shard.flush_all_pages()?;
        }
        Ok(())
    }
}
