// Fault Injection Tests for ClockCache
// These tests simulate device failures to check that no cached data is lost

use clockcache::{Cache, Error, IoOp, MemBlockStore};
use std::sync::Arc;

fn cache(
    block_size: usize,
    cache_blocks: usize,
) -> (Arc<MemBlockStore>, Cache<Arc<MemBlockStore>>) {
    let store = Arc::new(MemBlockStore::recording(block_size));
    let cache = Cache::with_geometry(Arc::clone(&store), block_size, cache_blocks).unwrap();
    (store, cache)
}

/// Test that a failed write-back during eviction leaves the victim intact
#[test]
fn test_eviction_write_back_failure() {
    let (store, cache) = cache(2, 1);
    cache.write(1, &[1, 1]).unwrap();

    store.fail_writes(true);
    let err = cache.write(2, &[2, 2]).unwrap_err();
    assert!(matches!(err, Error::Device(_)));
    assert!(cache.contains(1));
    assert!(!cache.contains(2));
    assert_eq!(cache.dirty_count(), 1);

    // Block 1 is still served from the cache
    store.fail_writes(false);
    assert_eq!(cache.read_block(1).unwrap().to_vec(), &[1, 1]);
}

/// Test that a failed fetch on a read miss installs nothing
#[test]
fn test_read_miss_device_failure() {
    let (store, cache) = cache(2, 2);
    store.fail_reads(true);

    let mut buf = [0u8; 2];
    assert!(cache.read(4, &mut buf).is_err());
    assert!(cache.is_empty());

    store.fail_reads(false);
    store.preload(4, &[4, 4]);
    cache.read(4, &mut buf).unwrap();
    assert_eq!(buf, [4, 4]);
}

/// Test that a failed fetch after a successful write-back keeps the data safe
#[test]
fn test_read_miss_failure_after_write_back() {
    let (store, cache) = cache(1, 1);
    cache.write(1, &[1]).unwrap();

    store.fail_reads(true);
    assert!(cache.read(2, &mut [0u8; 1]).is_err());

    // The victim was written back before the failed fetch
    assert_eq!(store.block(1), Some(vec![1]));
    assert!(cache.contains(1));
    assert_eq!(cache.dirty_count(), 0);
}

/// Test that sync reports failures and keeps the unwritten blocks dirty
#[test]
fn test_sync_failure_keeps_dirty() {
    let (store, cache) = cache(1, 3);
    cache.write(1, &[1]).unwrap();
    cache.write(2, &[2]).unwrap();

    store.fail_writes(true);
    assert!(cache.sync().is_err());
    assert_eq!(cache.dirty_count(), 2);
    assert_eq!(cache.len(), 2);

    store.fail_writes(false);
    cache.sync().unwrap();
    assert_eq!(cache.dirty_count(), 0);
    assert_eq!(store.writes(), 2);
}

/// Test that flush does not drop blocks it failed to write back
#[test]
fn test_flush_failure_retains_dirty() {
    let (store, cache) = cache(1, 3);
    cache.write(1, &[1]).unwrap();
    store.preload(2, &[2]);
    cache.read(2, &mut [0u8; 1]).unwrap();

    store.fail_writes(true);
    assert!(cache.flush().is_err());

    // Clean block 2 is dropped, dirty block 1 survives
    assert!(cache.contains(1));
    assert!(!cache.contains(2));
    assert_eq!(cache.len(), 1);

    store.fail_writes(false);
    cache.flush().unwrap();
    assert!(cache.is_empty());
    assert_eq!(store.log(), vec![IoOp::Read(2), IoOp::Write(1, vec![1])]);
}

/// Test that rejected calls leave statistics untouched
#[test]
fn test_rejected_calls_not_counted() {
    let (_store, cache) = cache(4, 1);
    let _ = cache.write(-1, &[0; 4]);
    let _ = cache.write(0, &[0; 2]);
    let _ = cache.read(-7, &mut [0; 4]);

    let stats = cache.stats();
    assert_eq!(stats.reads, 0);
    assert_eq!(stats.writes, 0);
    assert_eq!(stats.lookups(), 0);
}
