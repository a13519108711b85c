//! Random-access byte sources.
//!
//! A [`Reader`] hands out arbitrary byte ranges of an underlying source. Reads
//! near the end of the source are short rather than failing; callers decide
//! whether the bytes they got are enough to decode what they need.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::trace;

/// Upper bound on the buffer reserved up front for a single read.
const MAX_PREALLOC: usize = 1 << 20;

/// A random-access byte source.
pub trait Reader: Send + Sync {
    /// Reads up to `length` bytes starting at `offset`.
    ///
    /// Returns fewer bytes than requested when the source ends early and an
    /// empty buffer when `offset` is past the end. Only genuine I/O failures
    /// are errors.
    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>>;

    /// Returns the total size of the source in bytes.
    fn size(&self) -> io::Result<u64>;
}

/// A reader over a file on the local filesystem.
///
/// The file is opened for each call and closed before the call returns, so no
/// descriptor outlives a single read.
#[derive(Debug, Clone)]
pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reader for FileReader {
    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::with_capacity(length.min(MAX_PREALLOC));
        file.take(length as u64).read_to_end(&mut buf)?;

        trace!(
            path = %self.path.display(),
            offset,
            requested = length,
            read = buf.len(),
            "read file range"
        );
        Ok(buf)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

/// A reader over an in-memory buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// The whole underlying buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Reader for MemoryReader {
    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let len = self.data.len();
        let start = usize::try_from(offset).map_or(len, |o| o.min(len));
        let end = start.saturating_add(length).min(len);
        Ok(self.data[start..end].to_vec())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }
}
