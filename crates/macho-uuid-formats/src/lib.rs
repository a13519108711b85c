//! # macho-uuid-formats
//!
//! Decoders for identifying Mach-O images by their build UUID:
//! - Mach-O headers (32/64-bit, both byte orders)
//! - load command streams, scanned for `LC_UUID`
//! - fat (universal) archives, split into per-architecture members
//!
//! Everything reads through the [`Reader`] trait, so the same code works on
//! files and in-memory buffers.

pub mod error;
pub mod fat;
pub mod macho;
pub mod reader;

pub use error::{HeaderError, ParseError};
pub use fat::{FatArch, FatArchive, FAT_MAGIC};
pub use macho::{is_macho, CpuType, MachHeader, MachoMember};
pub use reader::{FileReader, MemoryReader, Reader};

/// Detected container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryType {
    MachO,
    Fat,
    Unknown,
}

/// Detect whether `reader` holds a thin Mach-O image, a fat archive, or
/// neither.
pub fn detect_format(reader: &dyn Reader) -> BinaryType {
    if FatArchive::is_fat(reader) {
        BinaryType::Fat
    } else if is_macho(reader) {
        BinaryType::MachO
    } else {
        BinaryType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        let fat = MemoryReader::new(vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 0]);
        assert_eq!(detect_format(&fat), BinaryType::Fat);

        let mut thin = vec![0u8; 32];
        thin[0..4].copy_from_slice(&macho::MH_MAGIC_64.to_le_bytes());
        assert_eq!(detect_format(&MemoryReader::new(thin)), BinaryType::MachO);

        let elf = MemoryReader::new(b"\x7fELF\x02\x01\x01\x00".to_vec());
        assert_eq!(detect_format(&elf), BinaryType::Unknown);
    }
}
