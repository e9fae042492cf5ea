//! File-backed block store.
//!
//! Block `i` lives at byte offset `i * block_size`. The file grows lazily:
//! blocks past the current end of file read back as zeros.

use super::BlockStore;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Fixed-geometry block device stored in a regular file.
#[derive(Debug)]
pub struct FileBlockStore {
    /// Path to the backing file
    path: PathBuf,
    /// Backing file, guarded for positioned I/O
    file: Mutex<File>,
    block_size: usize,
    num_blocks: u64,
}

impl FileBlockStore {
    /// Open an existing device file, or create it if it doesn't exist.
    pub fn open<P: AsRef<Path>>(path: P, block_size: usize, num_blocks: u64) -> Result<Self> {
        Self::with_options(path, block_size, num_blocks, false)
    }

    /// Create a fresh device file, truncating any existing contents.
    pub fn create<P: AsRef<Path>>(path: P, block_size: usize, num_blocks: u64) -> Result<Self> {
        Self::with_options(path, block_size, num_blocks, true)
    }

    fn with_options<P: AsRef<Path>>(
        path: P,
        block_size: usize,
        num_blocks: u64,
        truncate: bool,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::invalid_argument("block_size must be > 0"));
        }
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(&path)?;

        log::debug!(
            "Opened block device {:?}: {} blocks of {} bytes",
            path,
            num_blocks,
            block_size
        );

        Ok(Self { path, file: Mutex::new(file), block_size, num_blocks })
    }

    /// Get the path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of addressable blocks.
    pub fn num_blocks(&self) -> u64 {
        self.num_blocks
    }

    /// Flush file contents to persistent storage.
    pub fn sync_all(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    fn check(&self, block_id: u64, len: usize) -> Result<u64> {
        if block_id >= self.num_blocks {
            return Err(Error::BlockOutOfRange { block_id, num_blocks: self.num_blocks });
        }
        if len != self.block_size {
            return Err(Error::BufferSizeMismatch { expected: self.block_size, actual: len });
        }
        // Ids near u64::MAX would wrap when num_blocks is huge
        block_id
            .checked_mul(self.block_size as u64)
            .ok_or(Error::BlockOutOfRange { block_id, num_blocks: self.num_blocks })
    }
}

/// Read until `buf` is full or EOF, retrying interrupted reads. Returns the
/// number of bytes filled.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl BlockStore for FileBlockStore {
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        let offset = self.check(block_id, buf.len())?;
        let mut file = self.file.lock();

        file.seek(SeekFrom::Start(offset))?;
        let filled = read_up_to(&mut *file, buf)?;
        // Short read means the block lies (partly) past EOF
        buf[filled..].fill(0);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        let offset = self.check(block_id, buf.len())?;
        let mut file = self.file.lock();

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }
}
