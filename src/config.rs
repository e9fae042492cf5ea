//! Configuration options for the block cache.

use serde::{Deserialize, Serialize};

/// Geometry of a cache: how large each block is and how many slots it holds.
///
/// Both values are fixed for the lifetime of a [`Cache`](crate::Cache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Bytes per block.
    /// Default: 512
    pub block_size: usize,

    /// Number of cache slots.
    /// Default: 10
    pub cache_blocks: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { block_size: 512, cache_blocks: 10 }
    }
}

impl CacheOptions {
    /// Creates a new CacheOptions with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block size in bytes.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the number of cache slots.
    pub fn cache_blocks(mut self, count: usize) -> Self {
        self.cache_blocks = count;
        self
    }

    /// Parses options from a JSON document and validates them.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// ```
    /// use clockcache::CacheOptions;
    ///
    /// let opts = CacheOptions::from_json(r#"{"block_size": 4096}"#).unwrap();
    /// assert_eq!(opts.block_size, 4096);
    /// assert_eq!(opts.cache_blocks, 10);
    /// ```
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let options: CacheOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if self.cache_blocks == 0 {
            return Err(crate::Error::invalid_argument("cache_blocks must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = CacheOptions::default();
        assert_eq!(opts.block_size, 512);
        assert_eq!(opts.cache_blocks, 10);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_builder() {
        let opts = CacheOptions::new().block_size(4096).cache_blocks(64);
        assert_eq!(opts.block_size, 4096);
        assert_eq!(opts.cache_blocks, 64);
    }

    #[test]
    fn test_options_validation() {
        let mut opts = CacheOptions::default();
        opts.block_size = 0;
        assert!(opts.validate().is_err());

        opts.block_size = 2;
        opts.cache_blocks = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_options_from_json() {
        let opts = CacheOptions::from_json(r#"{"block_size": 2, "cache_blocks": 1}"#).unwrap();
        assert_eq!(opts, CacheOptions::new().block_size(2).cache_blocks(1));

        assert!(CacheOptions::from_json(r#"{"cache_blocks": 0}"#).is_err());
        assert!(matches!(
            CacheOptions::from_json("{"),
            Err(crate::Error::Config(_))
        ));
    }
}
