//! Error types for the block cache.

use crate::BlockId;
use std::io;
use thiserror::Error;

/// The result type used throughout the cache.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for cache and block store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The block id is the reserved sentinel (or otherwise negative).
    #[error("Invalid block id: {0}")]
    InvalidBlockId(BlockId),

    /// A caller buffer is shorter than one block.
    #[error("Buffer size mismatch: expected at least {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// The configured block size.
        expected: usize,
        /// The length of the buffer that was supplied.
        actual: usize,
    },

    /// The block store reported a failure.
    #[error("Device failure: {0}")]
    Device(String),

    /// The block id lies outside the device's geometry.
    #[error("Block {block_id} out of range (device has {num_blocks} blocks)")]
    BlockOutOfRange {
        /// The requested block.
        block_id: u64,
        /// Number of blocks on the device.
        num_blocks: u64,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new device failure error.
    pub fn device(msg: impl Into<String>) -> Self {
        Error::Device(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
