//! Mach-O load command traversal.
//!
//! Only `LC_UUID` is interpreted. Every other command is stepped over using
//! its `cmdsize`.

// Load command types
pub const LC_SEGMENT: u32 = 0x1;
pub const LC_SYMTAB: u32 = 0x2;
pub const LC_SEGMENT_64: u32 = 0x19;
pub const LC_UUID: u32 = 0x1B;

/// Size of the `cmd`/`cmdsize` prefix every load command starts with.
pub const LOAD_COMMAND_PREFIX: usize = 8;

/// Size of an `uuid_command`.
pub const UUID_COMMAND_SIZE: usize = LOAD_COMMAND_PREFIX + 16;

/// A raw load command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadCommand<'a> {
    /// Command type.
    pub cmd: u32,
    /// Size of the command including its prefix.
    pub cmdsize: u32,
    /// Command bytes, prefix included.
    pub data: &'a [u8],
}

impl LoadCommand<'_> {
    /// Returns the build UUID if this is a well-formed `LC_UUID` command.
    pub fn uuid(&self) -> Option<[u8; 16]> {
        if self.cmd != LC_UUID || self.data.len() < UUID_COMMAND_SIZE {
            return None;
        }
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&self.data[LOAD_COMMAND_PREFIX..UUID_COMMAND_SIZE]);
        Some(uuid)
    }
}

/// Iterator over the records of a load command stream.
///
/// Iteration ends quietly at the first record that does not fit: fewer than
/// eight bytes left, a `cmdsize` below eight, or a `cmdsize` running past the
/// end of the stream. An `LC_UUID` record is still yielded (trimmed to its
/// 24 bytes) when its own `cmdsize` is bad, and iteration ends after it.
/// Fields are read little-endian.
#[derive(Debug, Clone)]
pub struct LoadCommands<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> LoadCommands<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for LoadCommands<'a> {
    type Item = LoadCommand<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        let offset = self.offset;
        if offset.checked_add(LOAD_COMMAND_PREFIX)? > data.len() {
            return None;
        }

        let cmd = u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let cmdsize = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]);

        let size = cmdsize as usize;
        let malformed = size < LOAD_COMMAND_PREFIX || size > data.len() - offset;

        // The UUID payload has a fixed layout, so it is taken whenever its
        // bytes are present; a bad cmdsize only prevents stepping past it.
        if cmd == LC_UUID && UUID_COMMAND_SIZE <= data.len() - offset {
            self.offset = if malformed { data.len() } else { offset + size };
            return Some(LoadCommand {
                cmd,
                cmdsize,
                data: &data[offset..offset + UUID_COMMAND_SIZE],
            });
        }

        if malformed {
            // Stop for good on a malformed record.
            self.offset = data.len();
            return None;
        }

        self.offset = offset + size;
        Some(LoadCommand {
            cmd,
            cmdsize,
            data: &data[offset..offset + size],
        })
    }
}

/// Scans a load command stream for the first `LC_UUID`.
pub fn find_uuid(commands: &[u8]) -> Option<[u8; 16]> {
    LoadCommands::new(commands).find_map(|lc| lc.uuid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(cmd: u32, cmdsize: u32, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&cmd.to_le_bytes());
        data.extend_from_slice(&cmdsize.to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    const UUID: [u8; 16] = [
        0xac, 0x15, 0x90, 0x2f, 0xba, 0x2e, 0x31, 0xc1, 0x8b, 0x29, 0xda, 0x51, 0xe8, 0x89,
        0xb3, 0x21,
    ];

    #[test]
    fn test_find_uuid_after_other_commands() {
        let mut stream = command(LC_SEGMENT_64, 72, &[0u8; 64]);
        stream.extend(command(LC_SYMTAB, 24, &[0u8; 16]));
        stream.extend(command(LC_UUID, 24, &UUID));

        assert_eq!(find_uuid(&stream), Some(UUID));
        assert_eq!(LoadCommands::new(&stream).count(), 3);
    }

    #[test]
    fn test_find_uuid_first_match_wins() {
        let mut stream = command(LC_UUID, 24, &UUID);
        stream.extend(command(LC_UUID, 24, &[0xff; 16]));

        assert_eq!(find_uuid(&stream), Some(UUID));
    }

    #[test]
    fn test_no_uuid_command() {
        let stream = command(LC_SYMTAB, 24, &[0u8; 16]);
        assert_eq!(find_uuid(&stream), None);
    }

    #[test]
    fn test_zero_cmdsize_stops_scan() {
        let mut stream = command(LC_SYMTAB, 0, &[0u8; 16]);
        stream.extend(command(LC_UUID, 24, &UUID));

        assert_eq!(find_uuid(&stream), None);
        assert_eq!(LoadCommands::new(&stream).count(), 0);
    }

    #[test]
    fn test_uuid_with_zero_cmdsize() {
        let stream = command(LC_UUID, 0, &UUID);

        assert_eq!(find_uuid(&stream), Some(UUID));
        let records: Vec<_> = LoadCommands::new(&stream).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cmdsize, 0);
        assert_eq!(records[0].data.len(), UUID_COMMAND_SIZE);
    }

    #[test]
    fn test_uuid_with_overlong_cmdsize() {
        let mut stream = command(LC_SYMTAB, 24, &[0u8; 16]);
        stream.extend(command(LC_UUID, 64, &UUID));

        assert_eq!(find_uuid(&stream), Some(UUID));
        assert_eq!(LoadCommands::new(&stream).count(), 2);
    }

    #[test]
    fn test_uuid_with_short_cmdsize_still_read() {
        let mut stream = command(LC_UUID, 16, &UUID);
        stream.extend(command(LC_SYMTAB, 24, &[0u8; 16]));

        assert_eq!(find_uuid(&stream), Some(UUID));
    }

    #[test]
    fn test_overlong_cmdsize_stops_scan() {
        let mut stream = command(LC_SYMTAB, 24, &[0u8; 16]);
        stream.extend(command(LC_SEGMENT_64, 4096, &[0u8; 64]));
        stream.extend(command(LC_UUID, 24, &UUID));

        assert_eq!(find_uuid(&stream), None);
        assert_eq!(LoadCommands::new(&stream).count(), 1);
    }

    #[test]
    fn test_truncated_uuid_command() {
        // cmdsize claims the whole stream but the payload is cut short
        let stream = command(LC_UUID, 16, &UUID[..8]);
        assert_eq!(find_uuid(&stream), None);
    }

    #[test]
    fn test_short_streams() {
        assert_eq!(find_uuid(&[]), None);
        assert_eq!(find_uuid(&[0x1b]), None);
        assert_eq!(find_uuid(&[0x1b, 0, 0, 0, 24, 0, 0]), None);
    }
}
