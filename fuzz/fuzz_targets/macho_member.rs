#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use macho_uuid_formats::macho::find_uuid;
use macho_uuid_formats::{MachHeader, MachoMember, MemoryReader, Reader};

fuzz_target!(|data: &[u8]| {
    // Header and command parsing must never panic
    let _ = MachHeader::parse(data);
    let _ = find_uuid(data);

    let reader: Arc<dyn Reader> = Arc::new(MemoryReader::new(data));
    let member = MachoMember::new(reader, 0, data.len() as u64, None);

    if let Ok(header) = member.header() {
        let _ = header.cputype.name();
        let _ = header.header_size();
    }

    // Memoized results must agree with the first decode
    let first = member.uuid().ok();
    let second = member.uuid().ok();
    assert_eq!(first, second);

    let _ = member.uuid_hex();
    let _ = member.uuid_formatted();
    let _ = member.is_valid();
});
