//! A single Mach-O image inside a byte source.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::trace;
use uuid::Uuid;

use super::header::{CpuType, MachHeader, MACH_HEADER_64_SIZE};
use super::load_command::find_uuid;
use crate::reader::{FileReader, Reader};
use crate::{HeaderError, ParseError};

/// Chunk size used when copying a member out to a file.
const COPY_CHUNK: usize = 1 << 20;

/// One logical Mach-O image: a standalone file or one slice of a fat archive.
///
/// The header and UUID are decoded on first use and cached for the lifetime
/// of the member. Decoding happens outside the cache cell, so two threads
/// racing on a cold member may both decode; the first value stored wins and
/// both values are identical.
#[derive(Clone)]
pub struct MachoMember {
    reader: Arc<dyn Reader>,
    header_offset: u64,
    size: u64,
    path: Option<PathBuf>,
    header: OnceLock<MachHeader>,
    uuid: OnceLock<Option<Uuid>>,
}

impl MachoMember {
    /// Creates a member at `header_offset` spanning `size` bytes of `reader`.
    pub fn new(
        reader: Arc<dyn Reader>,
        header_offset: u64,
        size: u64,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            reader,
            header_offset,
            size,
            path,
            header: OnceLock::new(),
            uuid: OnceLock::new(),
        }
    }

    /// Creates a member covering the whole of `reader`.
    pub fn standalone(reader: Arc<dyn Reader>, path: Option<PathBuf>) -> io::Result<Self> {
        let size = reader.size()?;
        Ok(Self::new(reader, 0, size, path))
    }

    /// Creates a member covering the whole file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let reader: Arc<dyn Reader> = Arc::new(FileReader::new(path.clone()));
        Self::standalone(reader, Some(path))
    }

    /// The byte source backing this member.
    pub fn reader(&self) -> &Arc<dyn Reader> {
        &self.reader
    }

    /// Offset of the Mach-O header within the reader.
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// Length of this member in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Path the member was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the decoded Mach-O header.
    pub fn header(&self) -> Result<&MachHeader, ParseError> {
        if let Some(header) = self.header.get() {
            return Ok(header);
        }
        let header = read_header(self.reader.as_ref(), self.header_offset)?;
        Ok(self.header.get_or_init(|| header))
    }

    /// Returns the build UUID.
    ///
    /// `Ok(None)` means the command stream is well formed but carries no
    /// `LC_UUID` command.
    pub fn uuid(&self) -> Result<Option<Uuid>, ParseError> {
        if let Some(uuid) = self.uuid.get() {
            return Ok(*uuid);
        }
        let header = self.header()?;
        let uuid = read_uuid(self.reader.as_ref(), self.header_offset, header)?;
        Ok(*self.uuid.get_or_init(|| uuid))
    }

    /// Returns the UUID as 32 lowercase hex digits, or an empty string when
    /// the member has no UUID.
    pub fn uuid_hex(&self) -> Result<String, ParseError> {
        Ok(self
            .uuid()?
            .map(|uuid| uuid.simple().to_string())
            .unwrap_or_default())
    }

    /// Returns the UUID in dashed uppercase form, e.g.
    /// `AC15902F-BA2E-31C1-8B29-DA51E889B321`.
    pub fn uuid_formatted(&self) -> Result<Option<String>, ParseError> {
        Ok(self.uuid()?.map(format_uuid))
    }

    /// Returns the CPU type from the header.
    pub fn cpu_type(&self) -> Result<CpuType, ParseError> {
        Ok(self.header()?.cputype)
    }

    /// Returns true if the member decodes and carries a UUID.
    pub fn is_valid(&self) -> bool {
        matches!(self.uuid(), Ok(Some(_)))
    }

    /// Copies this member's bytes to a new file at `output`.
    ///
    /// For a fat slice this produces a standalone single-architecture
    /// Mach-O file.
    ///
    /// The bytes are staged in a temporary file next to `output` and moved
    /// into place only once the copy completes, so a failed copy leaves
    /// nothing at `output`.
    pub fn write_file(&self, output: impl AsRef<Path>) -> io::Result<()> {
        let output = output.as_ref();
        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".macho-uuid")
            .tempfile_in(parent)?;
        let mut offset = self.header_offset;
        let mut remaining = self.size;

        while remaining > 0 {
            let want = usize::try_from(remaining).map_or(COPY_CHUNK, |r| r.min(COPY_CHUNK));
            let chunk = self.reader.read(offset, want)?;
            if chunk.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended {remaining} bytes short of the member at offset {:#x}",
                        self.header_offset
                    ),
                ));
            }
            file.write_all(&chunk)?;
            offset += chunk.len() as u64;
            remaining -= chunk.len() as u64;
        }

        file.flush()?;
        file.persist(output).map_err(|err| err.error)?;
        trace!(output = %output.display(), size = self.size, "wrote member");
        Ok(())
    }
}

impl fmt::Debug for MachoMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachoMember")
            .field("header_offset", &self.header_offset)
            .field("size", &self.size)
            .field("path", &self.path)
            .field("uuid", &self.uuid.get())
            .finish_non_exhaustive()
    }
}

/// Formats a UUID as dashed uppercase hex.
pub fn format_uuid(uuid: Uuid) -> String {
    uuid.hyphenated()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string()
}

/// Reads and decodes the Mach-O header at `offset`.
pub fn read_header(reader: &dyn Reader, offset: u64) -> Result<MachHeader, ParseError> {
    let data = reader.read(offset, MACH_HEADER_64_SIZE)?;
    if data.len() < 4 {
        return Err(HeaderError::Unreadable { offset }.into());
    }
    Ok(MachHeader::parse(&data)?)
}

/// Reads the load command stream described by `header` and extracts the
/// `LC_UUID` command, if any.
pub fn read_uuid(
    reader: &dyn Reader,
    header_offset: u64,
    header: &MachHeader,
) -> Result<Option<Uuid>, ParseError> {
    if header.ncmds == 0 {
        return Err(ParseError::NoCommands);
    }
    if header.sizeofcmds == 0 {
        return Err(ParseError::NoCommandSize);
    }

    let offset = header_offset + header.header_size() as u64;
    let expected = header.sizeofcmds as usize;
    let commands = reader.read(offset, expected)?;
    if commands.len() < expected {
        return Err(ParseError::commands_unreadable(
            offset,
            expected,
            commands.len(),
        ));
    }

    let uuid = find_uuid(&commands).map(Uuid::from_bytes);
    trace!(header_offset, ?uuid, "scanned load commands");
    Ok(uuid)
}
