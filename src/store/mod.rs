//! Raw block devices consumed by the cache.
//!
//! A [`BlockStore`] is addressed in whole blocks. The cache never issues a
//! partial-block transfer: every buffer handed to a store is exactly one
//! block long.
//!
//! ## Provided stores
//!
//! - [`MemBlockStore`]: sparse in-memory device with an I/O log and fault injection
//! - [`FileBlockStore`]: fixed-geometry device backed by a regular file

pub mod file;
pub mod memory;

pub use file::FileBlockStore;
pub use memory::{IoOp, MemBlockStore};

use crate::error::Result;
use std::sync::Arc;

/// Block-addressed storage device.
///
/// Implementations must be safe to share across threads. The cache calls
/// them only while holding its own lock, but other users of the same device
/// may not.
pub trait BlockStore: Send + Sync {
    /// Reads block `block_id` into `buf`.
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()>;

    /// Writes `buf` to block `block_id`.
    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()>;
}

impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_block(block_id, buf)
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        (**self).write_block(block_id, buf)
    }
}

impl<T: BlockStore + ?Sized> BlockStore for &T {
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_block(block_id, buf)
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        (**self).write_block(block_id, buf)
    }
}
