//! # ClockCache - A Write-Back Block Cache
//!
//! ClockCache sits between a block consumer (a file system, a database page
//! layer) and a raw block-addressed device. It absorbs repeated reads and
//! writes to the same block without device I/O, and defers writes so dirty
//! data reaches the device only on eviction, [`Cache::sync`] or
//! [`Cache::flush`].
//!
//! ## Architecture
//!
//! - **Cache**: the public façade; one lock serializes every operation
//! - **Slot table**: a fixed array of block-sized slots plus a clock hand
//! - **Eviction**: free slots first, then enhanced second-chance (clock)
//! - **Block store**: the device, reached through the [`BlockStore`] trait
//!
//! ## Example Usage
//!
//! ```rust
//! use clockcache::{Cache, CacheOptions, MemBlockStore};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), clockcache::Error> {
//! let device = Arc::new(MemBlockStore::new(2));
//! let cache = Cache::new(device.clone(), CacheOptions::new().block_size(2).cache_blocks(1))?;
//!
//! cache.write(5, &[9, 9])?;
//! // Writing another block evicts block 5, writing it back first
//! cache.write(7, &[3, 3])?;
//! assert_eq!(device.block(5), Some(vec![9, 9]));
//!
//! let mut buf = [0u8; 2];
//! cache.read(7, &mut buf)?;
//! assert_eq!(buf, [3, 3]);
//!
//! cache.flush()?;
//! assert!(cache.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod cache;
pub mod config;
pub mod error;
pub mod store;

// Re-exports
pub use cache::{Cache, CacheStats, SlotState};
pub use config::CacheOptions;
pub use error::{Error, Result};
pub use store::{BlockStore, FileBlockStore, IoOp, MemBlockStore};

/// Identifier of a device block as accepted by the public API.
pub type BlockId = i64;

/// Reserved id meaning "no block". Never a valid argument.
pub const INVALID_BLOCK_ID: BlockId = -1;
