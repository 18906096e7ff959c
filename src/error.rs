use thiserror::Error;

use crate::page::PageId;

/// Failures reported at the buffer pool operation boundary. All variants are
/// locally recoverable; none abort the process.
#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("buffer pool exhausted: no free or evictable frame")]
    PoolExhausted,
    #[error("page {0} is not in the buffer pool")]
    PageNotFound(PageId),
    #[error("page {0} is pinned and cannot be deleted")]
    PagePinned(PageId),
    #[error("page {0} is not pinned")]
    DoubleUnpin(PageId),
    #[error("disk i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BufferPoolError>;
