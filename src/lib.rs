pub use crate::buffer_pool_manager::BufferPoolManager;
pub use crate::disk_manager::DiskManager;
pub use crate::error::{BufferPoolError, Result};
pub use crate::page::{FrameId, PageId, PageRef, PAGE_SIZE};
pub use crate::replacer::{LruReplacer, Replacer, ReplacerPolicy};
pub use crate::sharded_buffer_pool_manager::{BufferPoolOptions, ShardedBufferPoolManager};

mod buffer_pool_manager;
mod disk_manager;
mod error;
mod page;
mod replacer;
mod sharded_buffer_pool_manager;
