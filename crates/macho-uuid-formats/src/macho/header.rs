//! Mach-O header parsing.

use std::fmt;

use crate::HeaderError;

// Magic numbers, as read little-endian from the first four bytes
/// 32-bit, little-endian.
pub const MH_MAGIC: u32 = 0xFEEDFACE;
/// 32-bit, big-endian.
pub const MH_CIGAM: u32 = 0xCEFAEDFE;
/// 64-bit, little-endian.
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;
/// 64-bit, big-endian.
pub const MH_CIGAM_64: u32 = 0xCFFAEDFE;

/// Size of a 32-bit `mach_header`.
pub const MACH_HEADER_SIZE: usize = 28;
/// Size of a 64-bit `mach_header_64`.
pub const MACH_HEADER_64_SIZE: usize = 32;

// CPU types
const CPU_ARCH_ABI64: u32 = 0x01000000;
const CPU_ARCH_ABI64_32: u32 = 0x02000000;
pub const CPU_TYPE_X86: u32 = 7;
pub const CPU_TYPE_X86_64: u32 = CPU_TYPE_X86 | CPU_ARCH_ABI64;
pub const CPU_TYPE_ARM: u32 = 12;
pub const CPU_TYPE_ARM64: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64;
pub const CPU_TYPE_ARM64_32: u32 = CPU_TYPE_ARM | CPU_ARCH_ABI64_32;
pub const CPU_TYPE_POWERPC: u32 = 18;
pub const CPU_TYPE_POWERPC64: u32 = CPU_TYPE_POWERPC | CPU_ARCH_ABI64;

// File types
pub const MH_OBJECT: u32 = 0x1;
pub const MH_EXECUTE: u32 = 0x2;
pub const MH_DYLIB: u32 = 0x6;
pub const MH_DYLINKER: u32 = 0x7;
pub const MH_BUNDLE: u32 = 0x8;
pub const MH_DSYM: u32 = 0xA;
pub const MH_KEXT_BUNDLE: u32 = 0xB;

/// Word size of a Mach-O image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitness {
    Bits32,
    Bits64,
}

/// Byte order of the header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// CPU type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuType {
    X86,
    X86_64,
    Arm,
    Arm64,
    Arm64_32,
    PowerPc,
    PowerPc64,
    Other(u32),
}

impl CpuType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            CPU_TYPE_X86 => Self::X86,
            CPU_TYPE_X86_64 => Self::X86_64,
            CPU_TYPE_ARM => Self::Arm,
            CPU_TYPE_ARM64 => Self::Arm64,
            CPU_TYPE_ARM64_32 => Self::Arm64_32,
            CPU_TYPE_POWERPC => Self::PowerPc,
            CPU_TYPE_POWERPC64 => Self::PowerPc64,
            other => Self::Other(other),
        }
    }

    /// Conventional architecture name, if this CPU type has one.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::X86 => Some("x86"),
            Self::X86_64 => Some("x86_64"),
            Self::Arm => Some("arm"),
            Self::Arm64 => Some("arm64"),
            Self::Arm64_32 => Some("arm64_32"),
            Self::PowerPc => Some("powerpc"),
            Self::PowerPc64 => Some("powerpc64"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(value) => write!(f, "cpu({value:#x})"),
            known => f.write_str(known.name().unwrap_or("?")),
        }
    }
}

/// File type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Object,
    Execute,
    Dylib,
    Dylinker,
    Bundle,
    Dsym,
    KextBundle,
    Other(u32),
}

impl FileType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            MH_OBJECT => Self::Object,
            MH_EXECUTE => Self::Execute,
            MH_DYLIB => Self::Dylib,
            MH_DYLINKER => Self::Dylinker,
            MH_BUNDLE => Self::Bundle,
            MH_DSYM => Self::Dsym,
            MH_KEXT_BUNDLE => Self::KextBundle,
            other => Self::Other(other),
        }
    }
}

/// Mach-O header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachHeader {
    /// Magic number.
    pub magic: u32,
    /// 32- or 64-bit layout, implied by the magic.
    pub bitness: Bitness,
    /// Byte order of the header fields, implied by the magic.
    pub endianness: Endianness,
    /// CPU type.
    pub cputype: CpuType,
    /// CPU subtype.
    pub cpusubtype: u32,
    /// File type.
    pub filetype: FileType,
    /// Number of load commands.
    pub ncmds: u32,
    /// Size of all load commands.
    pub sizeofcmds: u32,
    /// Flags.
    pub flags: u32,
    /// Reserved (64-bit only).
    pub reserved: u32,
}

/// Decodes the layout implied by a magic number.
///
/// Returns `None` if `magic` is not one of the four Mach-O magics.
pub fn layout_for_magic(magic: u32) -> Option<(Bitness, Endianness)> {
    match magic {
        MH_MAGIC => Some((Bitness::Bits32, Endianness::Little)),
        MH_CIGAM => Some((Bitness::Bits32, Endianness::Big)),
        MH_MAGIC_64 => Some((Bitness::Bits64, Endianness::Little)),
        MH_CIGAM_64 => Some((Bitness::Bits64, Endianness::Big)),
        _ => None,
    }
}

/// Size of the header struct for the given bitness.
pub fn header_size_for(bitness: Bitness) -> usize {
    match bitness {
        Bitness::Bits32 => MACH_HEADER_SIZE,
        Bitness::Bits64 => MACH_HEADER_64_SIZE,
    }
}

impl MachHeader {
    /// Parse a Mach-O header from bytes.
    ///
    /// `data` may be shorter than 32 bytes as long as it covers the struct
    /// size the magic calls for.
    pub fn parse(data: &[u8]) -> Result<Self, HeaderError> {
        if data.len() < 4 {
            return Err(HeaderError::too_short(4, data.len()));
        }

        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let (bitness, endianness) =
            layout_for_magic(magic).ok_or_else(|| HeaderError::invalid_magic(&data[0..4]))?;

        let min_size = header_size_for(bitness);
        if data.len() < min_size {
            return Err(HeaderError::too_short(min_size, data.len()));
        }

        let read_u32 = |offset: usize| -> u32 {
            let bytes = [
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ];
            match endianness {
                Endianness::Little => u32::from_le_bytes(bytes),
                Endianness::Big => u32::from_be_bytes(bytes),
            }
        };

        let cputype = read_u32(4);
        let cpusubtype = read_u32(8);
        let filetype = read_u32(12);
        let ncmds = read_u32(16);
        let sizeofcmds = read_u32(20);
        let flags = read_u32(24);
        let reserved = match bitness {
            Bitness::Bits64 => read_u32(28),
            Bitness::Bits32 => 0,
        };

        Ok(Self {
            magic,
            bitness,
            endianness,
            cputype: CpuType::from_u32(cputype),
            cpusubtype,
            filetype: FileType::from_u32(filetype),
            ncmds,
            sizeofcmds,
            flags,
            reserved,
        })
    }

    /// Returns true if this is a 64-bit Mach-O.
    pub fn is_64bit(&self) -> bool {
        self.bitness == Bitness::Bits64
    }

    /// Returns the size of the header in bytes, i.e. where the load commands
    /// start relative to the header.
    pub fn header_size(&self) -> usize {
        header_size_for(self.bitness)
    }
}
