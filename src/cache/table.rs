//! Slot table: lookup, clock eviction and write-back.
//!
//! The table is a plain fixed-length array of [`CacheSlot`]s plus the clock
//! hand. It performs no locking of its own; [`Cache`](super::Cache) owns it
//! behind a single mutex and passes the block store in on every call, so all
//! device I/O happens with the lock held.

use super::slot::{CacheSlot, SlotState};
use super::stats::CacheStats;
use crate::error::Result;
use crate::store::BlockStore;

#[derive(Debug)]
pub(crate) struct CacheTable {
    slots: Vec<CacheSlot>,
    /// Slot chosen by the most recent miss, `None` before the first one
    last_victim: Option<usize>,
    stats: CacheStats,
}

impl CacheTable {
    pub(crate) fn new(block_size: usize, cache_blocks: usize) -> Self {
        Self {
            slots: (0..cache_blocks).map(|_| CacheSlot::new(block_size)).collect(),
            last_victim: None,
            stats: CacheStats::default(),
        }
    }

    /// Serve a read. `out` is exactly one block long.
    pub(crate) fn read<S: BlockStore + ?Sized>(
        &mut self,
        store: &S,
        block_id: u64,
        out: &mut [u8],
    ) -> Result<()> {
        self.stats.reads += 1;

        if let Some(idx) = self.find(block_id) {
            self.stats.hits += 1;
            log::trace!("Read hit: block {} in slot {}", block_id, idx);
            let slot = &mut self.slots[idx];
            slot.referenced = true;
            out.copy_from_slice(&slot.data);
            return Ok(());
        }

        self.stats.misses += 1;
        log::trace!("Read miss: block {}", block_id);

        let idx = self.select_victim();
        self.write_back(idx, store)?;

        // Fetch straight into the caller's buffer, then keep a private copy
        store.read_block(block_id, out)?;
        self.install(idx, block_id, out, false);
        Ok(())
    }

    /// Serve a write. `input` is exactly one block long.
    ///
    /// A write miss claims a slot without fetching the block's previous
    /// contents from the device.
    pub(crate) fn write<S: BlockStore + ?Sized>(
        &mut self,
        store: &S,
        block_id: u64,
        input: &[u8],
    ) -> Result<()> {
        self.stats.writes += 1;

        if let Some(idx) = self.find(block_id) {
            self.stats.hits += 1;
            log::trace!("Write hit: block {} in slot {}", block_id, idx);
            let slot = &mut self.slots[idx];
            slot.referenced = true;
            slot.dirty = true;
            slot.data.copy_from_slice(input);
            return Ok(());
        }

        self.stats.misses += 1;
        log::trace!("Write miss: block {}", block_id);

        let idx = self.select_victim();
        self.write_back(idx, store)?;
        self.install(idx, block_id, input, true);
        Ok(())
    }

    /// Write back every dirty slot, keeping all blocks resident.
    ///
    /// Every slot is attempted; the first failure is returned after the sweep.
    pub(crate) fn sync<S: BlockStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let mut written = 0;
        let mut first_err = None;

        for idx in 0..self.slots.len() {
            match self.write_back(idx, store) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => {
                    log::error!("Write-back of slot {} failed: {}", idx, e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        log::info!("Synced {} dirty blocks", written);
        first_err.map_or(Ok(()), Err)
    }

    /// Write back every dirty slot, then empty every slot that is clean.
    ///
    /// A slot whose write-back failed stays resident and dirty.
    pub(crate) fn flush<S: BlockStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let result = self.sync(store);

        let mut retained = 0;
        for slot in &mut self.slots {
            if slot.needs_write_back() {
                retained += 1;
            } else {
                slot.invalidate();
            }
        }
        self.last_victim = None;

        if retained > 0 {
            log::error!("Flush kept {} dirty blocks that could not be written back", retained);
        } else {
            log::info!("Flushed cache, all {} slots empty", self.slots.len());
        }
        result
    }

    pub(crate) fn find(&self, block_id: u64) -> Option<usize> {
        self.slots.iter().position(|slot| slot.block_id == Some(block_id))
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_free()).count()
    }

    pub(crate) fn dirty_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.needs_write_back()).count()
    }

    pub(crate) fn states(&self) -> Vec<SlotState> {
        self.slots.iter().map(CacheSlot::state).collect()
    }

    pub(crate) fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Pick the slot a miss will reuse: the first free slot if there is
    /// one, otherwise the clock victim. Moves the hand either way.
    fn select_victim(&mut self) -> usize {
        let idx = match self.slots.iter().position(CacheSlot::is_free) {
            Some(idx) => idx,
            None => self.next_victim(),
        };
        self.last_victim = Some(idx);
        idx
    }

    /// Second-chance sweep starting just past the last victim.
    ///
    /// Referenced slots lose their bit and are skipped, so the sweep ends
    /// within two revolutions.
    fn next_victim(&mut self) -> usize {
        let n = self.slots.len();
        let mut idx = self.last_victim.map_or(0, |v| (v + 1) % n);
        loop {
            let slot = &mut self.slots[idx];
            if !slot.referenced {
                return idx;
            }
            slot.referenced = false;
            idx = (idx + 1) % n;
        }
    }

    /// Persist slot `idx` if it is dirty. Returns whether a device write
    /// happened. On failure the slot stays dirty.
    fn write_back<S: BlockStore + ?Sized>(&mut self, idx: usize, store: &S) -> Result<bool> {
        let slot = &mut self.slots[idx];
        let block_id = match slot.block_id {
            Some(id) if slot.dirty => id,
            _ => return Ok(false),
        };

        store.write_block(block_id, &slot.data)?;
        slot.dirty = false;
        self.stats.write_backs += 1;
        log::debug!("Wrote back block {} from slot {}", block_id, idx);
        Ok(true)
    }

    /// Make slot `idx` hold `block_id` with a copy of `data`.
    fn install(&mut self, idx: usize, block_id: u64, data: &[u8], dirty: bool) {
        let slot = &mut self.slots[idx];
        let evicted = slot.block_id.replace(block_id);
        slot.data.copy_from_slice(data);
        slot.referenced = true;
        slot.dirty = dirty;

        if let Some(old) = evicted {
            self.stats.evictions += 1;
            log::debug!("Evicted block {} from slot {} for block {}", old, idx, block_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{IoOp, MemBlockStore};

    fn resident(table: &CacheTable) -> Vec<Option<u64>> {
        table.states().iter().map(|s| s.block_id).collect()
    }

    #[test]
    fn test_free_slots_fill_in_order() {
        let store = MemBlockStore::recording(1);
        let mut table = CacheTable::new(1, 3);

        for id in [10, 20, 30] {
            table.write(&store, id, &[id as u8]).unwrap();
        }

        assert_eq!(resident(&table), vec![Some(10), Some(20), Some(30)]);
        assert_eq!(table.last_victim, Some(2));
        assert_eq!(table.stats().evictions, 0);
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_clock_clears_bits_and_wraps() {
        let store = MemBlockStore::recording(1);
        let mut table = CacheTable::new(1, 3);
        for id in [1, 2, 3] {
            table.write(&store, id, &[id as u8]).unwrap();
        }

        // All referenced: the sweep clears 0, 1, 2 then takes slot 0
        table.write(&store, 4, &[4]).unwrap();
        assert_eq!(resident(&table), vec![Some(4), Some(2), Some(3)]);
        assert_eq!(table.last_victim, Some(0));
        let states = table.states();
        assert!(states[0].referenced);
        assert!(!states[1].referenced);
        assert!(!states[2].referenced);
        assert_eq!(store.log(), vec![IoOp::Write(1, vec![1])]);
    }

    #[test]
    fn test_second_chance_spares_referenced_slot() {
        let store = MemBlockStore::recording(1);
        let mut table = CacheTable::new(1, 3);
        for id in [1, 2, 3] {
            table.write(&store, id, &[id as u8]).unwrap();
        }
        table.write(&store, 4, &[4]).unwrap();

        // Touch block 2 so the hand skips it on the next sweep
        let mut buf = [0u8; 1];
        table.read(&store, 2, &mut buf).unwrap();
        assert_eq!(buf, [2]);

        table.write(&store, 5, &[5]).unwrap();
        assert_eq!(resident(&table), vec![Some(4), Some(2), Some(5)]);
        assert_eq!(table.last_victim, Some(2));
        assert!(!table.states()[1].referenced);
        assert_eq!(store.block(3), Some(vec![3]));
    }

    #[test]
    fn test_clean_victim_not_written_back() {
        let store = MemBlockStore::recording(2);
        store.preload(1, &[7, 7]);
        let mut table = CacheTable::new(2, 1);

        let mut buf = [0u8; 2];
        table.read(&store, 1, &mut buf).unwrap();
        table.read(&store, 2, &mut buf).unwrap();

        assert_eq!(store.writes(), 0);
        assert_eq!(store.reads(), 2);
        assert_eq!(table.stats().evictions, 1);
        assert_eq!(table.stats().write_backs, 0);
    }

    #[test]
    fn test_failed_write_back_keeps_victim() {
        let store = MemBlockStore::recording(1);
        let mut table = CacheTable::new(1, 1);
        table.write(&store, 1, &[1]).unwrap();

        store.fail_writes(true);
        assert!(table.write(&store, 2, &[2]).is_err());
        assert_eq!(resident(&table), vec![Some(1)]);
        assert_eq!(table.dirty_count(), 1);

        store.fail_writes(false);
        table.write(&store, 2, &[2]).unwrap();
        assert_eq!(resident(&table), vec![Some(2)]);
        assert_eq!(store.block(1), Some(vec![1]));
    }

    #[test]
    fn test_flush_resets_cursor() {
        let store = MemBlockStore::recording(1);
        let mut table = CacheTable::new(1, 2);
        table.write(&store, 1, &[1]).unwrap();
        table.write(&store, 2, &[2]).unwrap();

        table.flush(&store).unwrap();
        assert_eq!(table.len(), 0);
        assert_eq!(table.last_victim, None);
        assert_eq!(table.stats().write_backs, 2);
    }
}
