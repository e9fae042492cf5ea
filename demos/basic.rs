//! Basic usage example for ClockCache
//!
//! This example demonstrates the fundamental operations:
//! - Opening a file-backed block device
//! - Writing and reading blocks through the cache
//! - Watching evictions write dirty blocks back
//! - Syncing and flushing
//!
//! Run with `RUST_LOG=debug` to see every eviction and write-back.

use anyhow::Context;
use clockcache::{Cache, CacheOptions, FileBlockStore};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading options from {}", path))?;
            CacheOptions::from_json(&json)?
        }
        None => CacheOptions::default().block_size(512).cache_blocks(4),
    };

    let device = FileBlockStore::create("./example_disk.img", options.block_size, 1000)
        .context("creating block device")?;
    let cache = Cache::new(device, options)?;
    println!("Cache ready: {} slots of {} bytes", cache.capacity(), cache.block_size());

    // Write more blocks than the cache can hold
    println!("Writing blocks 0..10...");
    for id in 0..10i64 {
        let data = vec![id as u8; cache.block_size()];
        cache.write(id, &data)?;
    }

    // Read them back; early blocks come from the device
    println!("Reading blocks back...");
    let mut buf = vec![0u8; cache.block_size()];
    for id in 0..10i64 {
        cache.read(id, &mut buf)?;
        println!("block {} => first byte {}", id, buf[0]);
    }

    // The sentinel is rejected
    if cache.read(clockcache::INVALID_BLOCK_ID, &mut buf).is_err() {
        println!("Invalid block id rejected");
    }

    cache.sync()?;
    println!("After sync: {} resident, {} dirty", cache.len(), cache.dirty_count());

    cache.flush()?;
    cache.store().sync_all()?;
    println!("After flush: {} resident", cache.len());

    println!("Stats: {}", serde_json::to_string_pretty(&cache.stats())?);

    std::fs::remove_file("./example_disk.img")?;
    Ok(())
}
