//! In-memory block store.
//!
//! Keeps every written block in a map and counts each device call. A
//! recording store additionally keeps a log of every call, which tests use
//! to observe exactly what the cache sent to the disk.

use super::BlockStore;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A single device call observed by a recording [`MemBlockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoOp {
    /// `read_block(block_id)`
    Read(u64),
    /// `write_block(block_id, data)`
    Write(u64, Vec<u8>),
}

#[derive(Debug, Default)]
struct Inner {
    blocks: HashMap<u64, Vec<u8>>,
    /// Only appended to when recording
    log: Vec<IoOp>,
}

/// Sparse in-memory block device.
///
/// Blocks that were never written read back as zeros.
#[derive(Debug)]
pub struct MemBlockStore {
    block_size: usize,
    record: bool,
    inner: Mutex<Inner>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemBlockStore {
    /// Create an empty store with the given block size.
    ///
    /// Device calls are counted but not logged.
    pub fn new(block_size: usize) -> Self {
        Self::with_recording(block_size, false)
    }

    /// Create an empty store that logs every device call, see [`MemBlockStore::log`].
    ///
    /// The log grows with every call until [`MemBlockStore::clear_log`].
    pub fn recording(block_size: usize) -> Self {
        Self::with_recording(block_size, true)
    }

    fn with_recording(block_size: usize, record: bool) -> Self {
        Self {
            block_size,
            record,
            inner: Mutex::new(Inner::default()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Block size this store was created with.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Store `data` as the persisted contents of `block_id` without counting
    /// a device call.
    pub fn preload(&self, block_id: u64, data: &[u8]) {
        let mut block = vec![0u8; self.block_size];
        let n = data.len().min(self.block_size);
        block[..n].copy_from_slice(&data[..n]);
        self.inner.lock().blocks.insert(block_id, block);
    }

    /// Persisted contents of `block_id`, if it was ever written.
    pub fn block(&self, block_id: u64) -> Option<Vec<u8>> {
        self.inner.lock().blocks.get(&block_id).cloned()
    }

    /// Every device call since the last [`MemBlockStore::clear_log`], oldest
    /// first. Always empty unless the store was created with
    /// [`MemBlockStore::recording`].
    pub fn log(&self) -> Vec<IoOp> {
        self.inner.lock().log.clone()
    }

    /// Number of successful `read_block` calls since the last clear.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `write_block` calls since the last clear.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Forget the recorded device calls and zero the counters. Stored
    /// blocks are kept.
    pub fn clear_log(&self) {
        let mut inner = self.inner.lock();
        inner.log.clear();
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Make every subsequent `read_block` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `write_block` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.block_size {
            return Err(Error::BufferSizeMismatch { expected: self.block_size, actual: len });
        }
        Ok(())
    }
}

impl BlockStore for MemBlockStore {
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        self.check_len(buf.len())?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::device(format!("injected read failure on block {}", block_id)));
        }

        let mut inner = self.inner.lock();
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.record {
            inner.log.push(IoOp::Read(block_id));
        }
        match inner.blocks.get(&block_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        self.check_len(buf.len())?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::device(format!("injected write failure on block {}", block_id)));
        }

        let mut inner = self.inner.lock();
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.record {
            inner.log.push(IoOp::Write(block_id, buf.to_vec()));
        }
        inner
            .blocks
            .entry(block_id)
            .and_modify(|block| block.copy_from_slice(buf))
            .or_insert_with(|| buf.to_vec());
        Ok(())
    }
}
