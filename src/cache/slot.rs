//! A single cache slot.

use serde::Serialize;

/// One fixed-size storage unit of the cache table.
///
/// The data buffer is allocated once at construction and is always exactly
/// one block long, even while the slot is empty.
#[derive(Debug, Clone)]
pub(crate) struct CacheSlot {
    /// Device block currently resident, `None` when the slot is free
    pub(crate) block_id: Option<u64>,
    /// Accessed since the clock hand last passed
    pub(crate) referenced: bool,
    /// Contents differ from the device
    pub(crate) dirty: bool,
    pub(crate) data: Box<[u8]>,
}

impl CacheSlot {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            block_id: None,
            referenced: false,
            dirty: false,
            data: vec![0u8; block_size].into_boxed_slice(),
        }
    }

    pub(crate) fn is_free(&self) -> bool {
        self.block_id.is_none()
    }

    /// Dirty and holding a block, i.e. needs a write-back before reuse.
    pub(crate) fn needs_write_back(&self) -> bool {
        self.dirty && self.block_id.is_some()
    }

    /// Return the slot to the empty state. The buffer is kept.
    pub(crate) fn invalidate(&mut self) {
        self.block_id = None;
        self.referenced = false;
        self.dirty = false;
    }

    pub(crate) fn state(&self) -> SlotState {
        SlotState { block_id: self.block_id, referenced: self.referenced, dirty: self.dirty }
    }
}

/// Point-in-time view of a slot's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotState {
    /// Resident block, `None` if the slot is empty.
    pub block_id: Option<u64>,
    /// Reference bit.
    pub referenced: bool,
    /// Dirty bit.
    pub dirty: bool,
}

impl SlotState {
    /// Returns true if the slot holds no block.
    pub fn is_empty(&self) -> bool {
        self.block_id.is_none()
    }
}
