//! Fat (universal) archive decoding.
//!
//! A fat archive is a big-endian header, an architecture table, and one
//! Mach-O image per architecture at the offsets the table gives.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::macho::{CpuType, MachoMember};
use crate::reader::{FileReader, Reader};
use crate::ParseError;

/// Fat magic, stored big-endian on disk as `CA FE BA BE`.
pub const FAT_MAGIC: u32 = 0xCAFEBABE;

/// Offset of the architecture count.
const NFAT_ARCH_OFFSET: u64 = 4;
/// Offset of the first architecture table entry.
const FAT_ARCH_TABLE_OFFSET: u64 = 8;
/// Size of one `fat_arch` entry.
const FAT_ARCH_SIZE: u64 = 20;
/// Bytes of a `fat_arch` entry up to and including `size`.
const FAT_ARCH_REQUIRED: usize = 16;

/// Architecture entry in a fat binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatArch {
    /// CPU type.
    pub cputype: CpuType,
    /// CPU subtype.
    pub cpusubtype: u32,
    /// File offset to this architecture.
    pub offset: u32,
    /// Size of this architecture.
    pub size: u32,
    /// Alignment (power of 2).
    pub align: u32,
}

impl FatArch {
    /// Parse a table entry. `data` must hold at least the first 16 bytes;
    /// a missing `align` reads as zero.
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FAT_ARCH_REQUIRED {
            return None;
        }
        let read_u32 = |o: usize| -> u32 {
            u32::from_be_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]])
        };

        Some(Self {
            cputype: CpuType::from_u32(read_u32(0)),
            cpusubtype: read_u32(4),
            offset: read_u32(8),
            size: read_u32(12),
            align: if data.len() >= FAT_ARCH_SIZE as usize {
                read_u32(16)
            } else {
                0
            },
        })
    }
}

/// A fat archive over a byte source.
///
/// The member list is decoded once and cached.
pub struct FatArchive {
    reader: Arc<dyn Reader>,
    path: Option<PathBuf>,
    members: OnceLock<Vec<MachoMember>>,
}

impl FatArchive {
    pub fn new(reader: Arc<dyn Reader>, path: Option<PathBuf>) -> Self {
        Self {
            reader,
            path,
            members: OnceLock::new(),
        }
    }

    /// Creates a fat archive over the file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(Arc::new(FileReader::new(path.clone())), Some(path))
    }

    /// Returns true if `reader` starts with the fat magic.
    ///
    /// Never fails: read errors and short sources count as not fat.
    pub fn is_fat(reader: &dyn Reader) -> bool {
        matches!(reader.read(0, 4), Ok(magic) if magic == FAT_MAGIC.to_be_bytes())
    }

    /// Path the archive was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decodes the architecture table.
    pub fn architectures(&self) -> Result<Vec<FatArch>, ParseError> {
        let count = self.reader.read(NFAT_ARCH_OFFSET, 4)?;
        if count.len() < 4 {
            return Err(ParseError::fat_header_unreadable(
                NFAT_ARCH_OFFSET,
                4,
                count.len(),
            ));
        }
        let nfat_arch = u32::from_be_bytes([count[0], count[1], count[2], count[3]]);

        // The count is untrusted; the table read below bounds the real size.
        let mut architectures = Vec::with_capacity(nfat_arch.min(64) as usize);
        for i in 0..u64::from(nfat_arch) {
            let entry_offset = FAT_ARCH_TABLE_OFFSET + i * FAT_ARCH_SIZE;
            let entry = self.reader.read(entry_offset, FAT_ARCH_SIZE as usize)?;
            let arch = FatArch::parse(&entry).ok_or_else(|| {
                ParseError::fat_header_unreadable(entry_offset, FAT_ARCH_REQUIRED, entry.len())
            })?;
            architectures.push(arch);
        }

        Ok(architectures)
    }

    /// Returns one member per architecture that decodes to a UUID.
    ///
    /// Slots that fail to decode, or decode without a UUID, are dropped
    /// rather than failing the archive. Only a truncated fat header is an
    /// error.
    pub fn members(&self) -> Result<&[MachoMember], ParseError> {
        if let Some(members) = self.members.get() {
            return Ok(members);
        }
        let members = self.read_members()?;
        Ok(self.members.get_or_init(|| members))
    }

    /// Consumes the archive, returning its valid members.
    pub fn into_members(self) -> Result<Vec<MachoMember>, ParseError> {
        self.members()?;
        Ok(self.members.into_inner().unwrap_or_default())
    }

    fn read_members(&self) -> Result<Vec<MachoMember>, ParseError> {
        let mut members = Vec::new();

        for (index, arch) in self.architectures()?.into_iter().enumerate() {
            let member = MachoMember::new(
                Arc::clone(&self.reader),
                u64::from(arch.offset),
                u64::from(arch.size),
                self.path.clone(),
            );

            match member.uuid() {
                Ok(Some(_)) => members.push(member),
                Ok(None) => {
                    debug!(index, cpu = %arch.cputype, "skipping fat slot without a UUID");
                }
                Err(err) => {
                    debug!(index, cpu = %arch.cputype, %err, "skipping unreadable fat slot");
                }
            }
        }

        Ok(members)
    }
}

impl std::fmt::Debug for FatArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FatArchive")
            .field("path", &self.path)
            .field("members", &self.members.get())
            .finish_non_exhaustive()
    }
}
