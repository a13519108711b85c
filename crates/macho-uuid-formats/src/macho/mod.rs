//! Mach-O (macOS/iOS) header and UUID decoding.
//!
//! This module decodes just enough of a Mach-O image to identify it:
//! - 32-bit and 64-bit headers in either byte order
//! - the load command stream, scanned for `LC_UUID`

mod header;
mod load_command;
mod member;

pub use header::{
    header_size_for, layout_for_magic, Bitness, CpuType, Endianness, FileType, MachHeader,
    CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_ARM64_32, CPU_TYPE_POWERPC, CPU_TYPE_POWERPC64,
    CPU_TYPE_X86, CPU_TYPE_X86_64, MACH_HEADER_64_SIZE, MACH_HEADER_SIZE, MH_BUNDLE, MH_CIGAM,
    MH_CIGAM_64, MH_DSYM, MH_DYLIB, MH_EXECUTE, MH_MAGIC, MH_MAGIC_64,
};
pub use load_command::{
    find_uuid, LoadCommand, LoadCommands, LC_SEGMENT, LC_SEGMENT_64, LC_SYMTAB, LC_UUID,
};
pub use member::{format_uuid, read_header, read_uuid, MachoMember};

use crate::Reader;
use tracing::trace;

/// Returns true if `reader` starts with a Mach-O header.
///
/// Never fails: unreadable or foreign data is simply not Mach-O. Fat archives
/// are not Mach-O by this test; see [`crate::FatArchive::is_fat`].
pub fn is_macho(reader: &dyn Reader) -> bool {
    match read_header(reader, 0) {
        Ok(_) => true,
        Err(err) => {
            trace!(%err, "not a Mach-O file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryReader;

    #[test]
    fn test_is_macho() {
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(&MH_MAGIC_64.to_le_bytes());
        assert!(is_macho(&MemoryReader::new(data)));

        let mut data = vec![0u8; 28];
        data[0..4].copy_from_slice(&MH_CIGAM.to_le_bytes());
        assert!(is_macho(&MemoryReader::new(data)));
    }

    #[test]
    fn test_is_macho_rejects_fat_and_junk() {
        let fat = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 2];
        assert!(!is_macho(&MemoryReader::new(fat.to_vec())));
        assert!(!is_macho(&MemoryReader::new(b"<?xml version".to_vec())));
        assert!(!is_macho(&MemoryReader::default()));
    }
}
