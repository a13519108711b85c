#![no_main]

//! Builds fat archives that are mostly well formed so the fuzzer spends its
//! time past the magic and count checks.

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use macho_uuid_formats::{FatArchive, MemoryReader, Reader};

const FAT_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];
const MH_MAGIC: u32 = 0xfeedface;
const MH_MAGIC_64: u32 = 0xfeedfacf;
const MH_CIGAM: u32 = 0xcefaedfe;
const MH_CIGAM_64: u32 = 0xcffaedfe;
const LC_UUID: u32 = 0x1b;

#[derive(Debug, Arbitrary)]
struct FuzzedFat {
    /// Overrides the real slice count when set.
    nfat_arch: Option<u32>,
    slices: Vec<FuzzedSlice>,
    trailing: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct FuzzedSlice {
    cputype: u32,
    magic_choice: u8,
    has_uuid: bool,
    uuid: [u8; 16],
    /// Replaces the declared sizeofcmds when set.
    sizeofcmds: Option<u32>,
    /// Replaces the real slice offset when set.
    offset: Option<u32>,
    /// Replaces the real slice size when set.
    size: Option<u32>,
    extra_commands: Vec<u8>,
}

impl FuzzedSlice {
    fn image(&self) -> Vec<u8> {
        let magic = match self.magic_choice % 5 {
            0 => MH_MAGIC,
            1 => MH_MAGIC_64,
            2 => MH_CIGAM,
            3 => MH_CIGAM_64,
            _ => u32::from(self.magic_choice) << 8,
        };
        let is_64 = magic == MH_MAGIC_64 || magic == MH_CIGAM_64;
        let big_endian = magic == MH_CIGAM || magic == MH_CIGAM_64;
        let field = |value: u32| {
            if big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            }
        };

        let mut commands = Vec::new();
        if self.has_uuid {
            commands.extend_from_slice(&LC_UUID.to_le_bytes());
            commands.extend_from_slice(&24u32.to_le_bytes());
            commands.extend_from_slice(&self.uuid);
        }
        commands.extend_from_slice(&self.extra_commands);

        let mut data = Vec::new();
        data.extend_from_slice(&magic.to_le_bytes());
        data.extend_from_slice(&field(self.cputype));
        data.extend_from_slice(&field(0));
        data.extend_from_slice(&field(2));
        data.extend_from_slice(&field(1));
        data.extend_from_slice(&field(
            self.sizeofcmds.unwrap_or(commands.len() as u32),
        ));
        data.extend_from_slice(&field(0));
        if is_64 {
            data.extend_from_slice(&field(0));
        }
        data.extend(commands);
        data
    }
}

impl FuzzedFat {
    fn build(&self) -> Vec<u8> {
        let slices: Vec<_> = self.slices.iter().take(8).collect();
        let count = self.nfat_arch.unwrap_or(slices.len() as u32);

        let mut data = Vec::new();
        data.extend_from_slice(&FAT_MAGIC);
        data.extend_from_slice(&count.to_be_bytes());

        let images: Vec<_> = slices.iter().map(|s| s.image()).collect();
        let mut offset = 8 + 20 * slices.len();
        let mut table = Vec::new();
        for (slice, image) in slices.iter().zip(&images) {
            table.extend_from_slice(&slice.cputype.to_be_bytes());
            table.extend_from_slice(&0u32.to_be_bytes());
            table.extend_from_slice(&slice.offset.unwrap_or(offset as u32).to_be_bytes());
            table.extend_from_slice(&slice.size.unwrap_or(image.len() as u32).to_be_bytes());
            table.extend_from_slice(&0u32.to_be_bytes());
            offset += image.len();
        }
        data.extend(table);
        for image in images {
            data.extend(image);
        }
        data.extend_from_slice(&self.trailing);
        data
    }
}

fuzz_target!(|input: FuzzedFat| {
    let data = input.build();
    let reader: Arc<dyn Reader> = Arc::new(MemoryReader::new(data));
    let archive = FatArchive::new(reader, None);

    let Ok(members) = archive.members() else {
        return;
    };
    assert!(members.len() <= input.nfat_arch.unwrap_or(u32::MAX) as usize);
    for member in members {
        assert!(matches!(member.uuid(), Ok(Some(_))));
    }
});
