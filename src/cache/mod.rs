//! Write-back block cache with second-chance (clock) eviction.
//!
//! The cache holds a fixed number of block-sized slots in front of a
//! [`BlockStore`]. Reads and writes to resident blocks never touch the
//! device; dirty data reaches the device only when its slot is reused, or on
//! [`Cache::sync`] / [`Cache::flush`].

mod slot;
mod stats;
mod table;

pub use slot::SlotState;
pub use stats::CacheStats;

use crate::config::CacheOptions;
use crate::error::{Error, Result};
use crate::store::BlockStore;
use crate::BlockId;
use bytes::Bytes;
use parking_lot::Mutex;
use table::CacheTable;

/// Thread-safe write-back block cache.
///
/// Every public operation holds one table-wide lock for its full duration,
/// including any device I/O it triggers. Concurrent callers are fully
/// serialized.
///
/// # Thread Safety
///
/// `Cache` is `Send + Sync` whenever its store is, and can be shared across
/// threads using `Arc<Cache<S>>`.
pub struct Cache<S: BlockStore> {
    /// Backing device
    store: S,
    /// Fixed geometry
    options: CacheOptions,
    /// Slots and clock hand
    table: Mutex<CacheTable>,
}

impl<S: BlockStore> Cache<S> {
    /// Create a cache in front of `store`. All slots start empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if either dimension is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use clockcache::{Cache, CacheOptions, MemBlockStore};
    ///
    /// # fn main() -> Result<(), clockcache::Error> {
    /// let options = CacheOptions::new().block_size(512).cache_blocks(10);
    /// let cache = Cache::new(MemBlockStore::new(512), options)?;
    ///
    /// cache.write(3, &[7u8; 512])?;
    /// let mut buf = [0u8; 512];
    /// cache.read(3, &mut buf)?;
    /// assert_eq!(buf, [7u8; 512]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(store: S, options: CacheOptions) -> Result<Self> {
        options.validate()?;

        log::debug!(
            "Creating cache: {} slots of {} bytes",
            options.cache_blocks,
            options.block_size
        );

        Ok(Self {
            store,
            options,
            table: Mutex::new(CacheTable::new(options.block_size, options.cache_blocks)),
        })
    }

    /// Shorthand for [`Cache::new`] with explicit dimensions.
    pub fn with_geometry(store: S, block_size: usize, cache_blocks: usize) -> Result<Self> {
        Self::new(store, CacheOptions { block_size, cache_blocks })
    }

    /// Read block `block_id` into the first `block_size` bytes of `buf`.
    ///
    /// A resident block is copied out without device I/O. On a miss a slot
    /// is claimed (writing back its previous contents if dirty) and the
    /// block is fetched from the device.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidBlockId` for the sentinel or any negative id
    /// - `Error::BufferSizeMismatch` if `buf` is shorter than one block
    /// - any error the block store reports
    pub fn read(&self, block_id: BlockId, buf: &mut [u8]) -> Result<()> {
        let id = self.check_block_id(block_id)?;
        let block_size = self.check_buffer(buf.len())?;

        let mut table = self.table.lock();
        table.read(&self.store, id, &mut buf[..block_size])
    }

    /// Write the first `block_size` bytes of `buf` as the new contents of
    /// block `block_id`.
    ///
    /// The write stays in the cache until the slot is reused, synced or
    /// flushed. A miss does not read the block from the device first: the
    /// caller supplies the whole block.
    ///
    /// # Errors
    ///
    /// Same as [`Cache::read`].
    pub fn write(&self, block_id: BlockId, buf: &[u8]) -> Result<()> {
        let id = self.check_block_id(block_id)?;
        let block_size = self.check_buffer(buf.len())?;

        let mut table = self.table.lock();
        table.write(&self.store, id, &buf[..block_size])
    }

    /// Read a block into a freshly allocated buffer.
    pub fn read_block(&self, block_id: BlockId) -> Result<Bytes> {
        let mut buf = vec![0u8; self.options.block_size];
        self.read(block_id, &mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Write every dirty block back to the device. Blocks stay cached.
    ///
    /// # Errors
    ///
    /// Returns the first device error. Every dirty slot is still attempted;
    /// the ones that failed remain dirty.
    pub fn sync(&self) -> Result<()> {
        self.table.lock().sync(&self.store)
    }

    /// Write every dirty block back to the device and empty the cache.
    ///
    /// # Errors
    ///
    /// Returns the first device error. Slots whose write-back failed keep
    /// their block and stay dirty; all others are emptied.
    pub fn flush(&self) -> Result<()> {
        self.table.lock().flush(&self.store)
    }

    /// Bytes per block.
    pub fn block_size(&self) -> usize {
        self.options.block_size
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.options.cache_blocks
    }

    /// Number of slots currently holding a block.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Check if no slot holds a block.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if `block_id` is resident. Does not touch the reference bit.
    pub fn contains(&self, block_id: BlockId) -> bool {
        block_id >= 0 && self.table.lock().find(block_id as u64).is_some()
    }

    /// Number of slots with unwritten data.
    pub fn dirty_count(&self) -> usize {
        self.table.lock().dirty_count()
    }

    /// Metadata of every slot, in slot order.
    pub fn slots(&self) -> Vec<SlotState> {
        self.table.lock().states()
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.table.lock().stats().clone()
    }

    /// Reset cache statistics to zero.
    pub fn reset_stats(&self) {
        self.table.lock().reset_stats();
    }

    /// The backing block store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn check_block_id(&self, block_id: BlockId) -> Result<u64> {
        // Covers INVALID_BLOCK_ID along with every other negative id
        if block_id < 0 {
            log::warn!("Cache: invalid block id {}", block_id);
            return Err(Error::InvalidBlockId(block_id));
        }
        Ok(block_id as u64)
    }

    fn check_buffer(&self, len: usize) -> Result<usize> {
        let expected = self.options.block_size;
        if len < expected {
            log::warn!("Cache: buffer of {} bytes is shorter than a block ({})", len, expected);
            return Err(Error::BufferSizeMismatch { expected, actual: len });
        }
        Ok(expected)
    }
}

impl<S: BlockStore> std::fmt::Debug for Cache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("block_size", &self.options.block_size)
            .field("cache_blocks", &self.options.cache_blocks)
            .field("table", &*self.table.lock())
            .finish()
    }
}
