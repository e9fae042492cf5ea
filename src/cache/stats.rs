use serde::Serialize;

/// Statistics for cache performance monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of accepted read calls
    pub reads: u64,
    /// Number of accepted write calls
    pub writes: u64,
    /// Calls served from a resident slot
    pub hits: u64,
    /// Calls that had to claim a slot
    pub misses: u64,
    /// Misses that displaced a resident block
    pub evictions: u64,
    /// Dirty slots successfully written to the device
    pub write_backs: u64,
}

impl CacheStats {
    /// Total number of lookups (reads plus writes).
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
