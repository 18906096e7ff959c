use std::sync::Arc;

use anyhow::Result;
use log::info;

use pagepool::{BufferPoolOptions, DiskManager, ShardedBufferPoolManager};

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::temp_dir().join("pagepool-demo.db");
    let disk = Arc::new(DiskManager::open(&path)?);
    let pool = ShardedBufferPoolManager::new(
        disk,
        BufferPoolOptions {
            pool_size: 4,
            num_shards: 2,
            ..Default::default()
        },
    );
    info!("pool of {} frames over {} shards", pool.pool_size(), pool.num_shards());

    // Push four times the pool size through it and read everything back.
    let mut page_ids = Vec::new();
    for i in 0u64..32 {
        let page = pool.new_page()?;
        let page_id = page.page_id();
        page.write()[..8].copy_from_slice(&i.to_le_bytes());
        pool.unpin_page(page_id, true)?;
        page_ids.push(page_id);
    }
    pool.flush_all_pages()?;

    for (i, &page_id) in page_ids.iter().enumerate() {
        let page = pool.fetch_page(page_id)?;
        let stored = u64::from_le_bytes(page.read()[..8].try_into()?);
        assert_eq!(stored, i as u64);
        pool.unpin_page(page_id, false)?;
    }

    println!(
        "round-tripped {} pages through an {}-frame pool at {}",
        page_ids.len(),
        pool.pool_size(),
        path.display()
    );
    Ok(())
}
