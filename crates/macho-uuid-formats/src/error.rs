//! Error types for Mach-O and fat archive decoding.

use thiserror::Error;

/// Error type for Mach-O and fat archive decoding.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The Mach-O header could not be read or decoded.
    #[error("could not parse Mach-O header: {0}")]
    Header(#[from] HeaderError),

    /// The header declares zero load commands.
    #[error("Mach-O header doesn't contain commands")]
    NoCommands,

    /// The header declares a zero-length command section.
    #[error("Mach-O header doesn't contain command section size")]
    NoCommandSize,

    /// Fewer bytes were available than `sizeofcmds` declares.
    #[error("could not read Mach-O commands: expected {expected} bytes at offset {offset:#x}, got {actual}")]
    CommandsUnreadable {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// The fat architecture count or a table entry was truncated.
    #[error("could not read fat header: expected {expected} bytes at offset {offset:#x}, got {actual}")]
    FatHeaderUnreadable {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sub-cases of a Mach-O header failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Not even the magic number could be read.
    #[error("could not read header at offset {offset:#x}")]
    Unreadable { offset: u64 },

    /// The first four bytes are not a Mach-O magic number.
    #[error("invalid magic number: {actual:02x?}")]
    InvalidMagic { actual: Vec<u8> },

    /// The magic was recognized but the rest of the struct is missing.
    #[error("header too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

impl ParseError {
    /// Creates a new `CommandsUnreadable` error.
    pub fn commands_unreadable(offset: u64, expected: usize, actual: usize) -> Self {
        Self::CommandsUnreadable {
            offset,
            expected,
            actual,
        }
    }

    /// Creates a new `FatHeaderUnreadable` error.
    pub fn fat_header_unreadable(offset: u64, expected: usize, actual: usize) -> Self {
        Self::FatHeaderUnreadable {
            offset,
            expected,
            actual,
        }
    }

    /// Returns true if this error came from decoding the Mach-O header.
    pub fn is_header_error(&self) -> bool {
        matches!(self, Self::Header(_))
    }
}

impl HeaderError {
    /// Creates a new `InvalidMagic` error.
    pub fn invalid_magic(actual: &[u8]) -> Self {
        Self::InvalidMagic {
            actual: actual.to_vec(),
        }
    }

    /// Creates a new `TooShort` error.
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::TooShort { expected, actual }
    }
}
