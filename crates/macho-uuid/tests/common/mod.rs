//! Builders for synthetic Mach-O images, fat archives and bundles.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const MH_MAGIC_64: u32 = 0xFEEDFACF;
pub const MH_CIGAM: u32 = 0xCEFAEDFE;
pub const MH_EXECUTE: u32 = 0x2;
pub const MH_DYLIB: u32 = 0x6;
pub const MH_BUNDLE: u32 = 0x8;
pub const MH_DSYM: u32 = 0xA;
pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;
pub const CPU_TYPE_ARM64: u32 = 0x0100_000C;
pub const CPU_TYPE_POWERPC: u32 = 18;
pub const LC_SYMTAB: u32 = 0x2;
pub const LC_UUID: u32 = 0x1B;

/// Parses a 32-digit hex UUID into bytes.
pub fn uuid_bytes(hex: &str) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).unwrap();
    }
    bytes
}

fn load_commands(uuid: &str) -> Vec<u8> {
    let mut commands = Vec::new();
    commands.extend_from_slice(&LC_SYMTAB.to_le_bytes());
    commands.extend_from_slice(&24u32.to_le_bytes());
    commands.extend_from_slice(&[0u8; 16]);
    commands.extend_from_slice(&LC_UUID.to_le_bytes());
    commands.extend_from_slice(&24u32.to_le_bytes());
    commands.extend_from_slice(&uuid_bytes(uuid));
    commands
}

/// A little-endian 64-bit image carrying `uuid`, followed by `padding`
/// filler bytes standing in for segment data.
pub fn macho64(cputype: u32, filetype: u32, uuid: &str, padding: usize) -> Vec<u8> {
    let commands = load_commands(uuid);

    let mut data = Vec::new();
    data.extend_from_slice(&MH_MAGIC_64.to_le_bytes());
    data.extend_from_slice(&cputype.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&filetype.to_le_bytes());
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&(commands.len() as u32).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend(commands);
    data.resize(data.len() + padding, 0x90);
    data
}

/// A big-endian 32-bit image (PowerPC layout) carrying `uuid`.
pub fn macho32_be(uuid: &str) -> Vec<u8> {
    let commands = load_commands(uuid);

    let mut data = Vec::new();
    data.extend_from_slice(&MH_CIGAM.to_le_bytes());
    data.extend_from_slice(&CPU_TYPE_POWERPC.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&MH_EXECUTE.to_be_bytes());
    data.extend_from_slice(&2u32.to_be_bytes());
    data.extend_from_slice(&(commands.len() as u32).to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend(commands);
    data
}

/// Lays out `slices` behind a fat header, each aligned to 4 KiB.
pub fn fat(slices: &[(u32, Vec<u8>)]) -> Vec<u8> {
    const ALIGN: usize = 0x1000;

    let mut data = Vec::new();
    data.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
    data.extend_from_slice(&(slices.len() as u32).to_be_bytes());

    let mut offset = ALIGN;
    let mut placed = Vec::new();
    for (cputype, slice) in slices {
        data.extend_from_slice(&cputype.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&(offset as u32).to_be_bytes());
        data.extend_from_slice(&(slice.len() as u32).to_be_bytes());
        data.extend_from_slice(&12u32.to_be_bytes());
        placed.push(offset);
        offset += slice.len().div_ceil(ALIGN) * ALIGN;
    }
    for ((_, slice), at) in slices.iter().zip(placed) {
        data.resize(at, 0);
        data.extend_from_slice(slice);
    }
    data
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write(path: &Path, contents: impl AsRef<[u8]>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// UUIDs used across the bundle fixtures.
pub const DSYM_UUID: &str = "ac15902fba2e31c18b29da51e889b321";
pub const APP_UUID: &str = "59686d50e0a43fb9ad27baadad47e0bc";
pub const FRAMEWORK_UUID: &str = "c3e6032cb73e39d59d872acc2a515240";
pub const FAT_X86_UUID: &str = "39d9cb72de663ca6b85bbfa04b60782e";
pub const FAT_ARM_UUID: &str = "7f2b35c3974533d1b991ec0da93cc085";

/// `<root>/bugsplat.app.dSYM` holding one DWARF file.
pub fn dsym_bundle(root: &Path) -> std::path::PathBuf {
    let bundle = root.join("bugsplat.app.dSYM");
    write(
        &bundle.join("Contents/Info.plist"),
        "<?xml version=\"1.0\"?><plist/>",
    );
    write(
        &bundle.join("Contents/Resources/DWARF/bugsplat"),
        macho64(CPU_TYPE_ARM64, MH_DSYM, DSYM_UUID, 2048),
    );
    bundle
}

/// `<root>/bugsplat.framework` holding its own binary and a bundle with a
/// two-architecture fat binary.
pub fn framework_bundle(root: &Path) -> std::path::PathBuf {
    let framework = root.join("bugsplat.framework");
    write(
        &framework.join("bugsplat"),
        macho64(CPU_TYPE_ARM64, MH_EXECUTE, FRAMEWORK_UUID, 512),
    );
    write(&framework.join("Info.plist"), "<plist/>");
    write(&framework.join("Headers/BugSplat.h"), "#import <Foundation/Foundation.h>\n");
    write(
        &framework.join("HockeySDKResources.bundle/Contents/MacOS/HockeySDKResources"),
        fat(&[
            (
                CPU_TYPE_X86_64,
                macho64(CPU_TYPE_X86_64, MH_BUNDLE, FAT_X86_UUID, 128),
            ),
            (
                CPU_TYPE_ARM64,
                macho64(CPU_TYPE_ARM64, MH_BUNDLE, FAT_ARM_UUID, 128),
            ),
        ]),
    );
    write(
        &framework.join("HockeySDKResources.bundle/Contents/Resources/de.lproj/Strings"),
        "\"Cancel\" = \"Abbrechen\";",
    );
    framework
}
