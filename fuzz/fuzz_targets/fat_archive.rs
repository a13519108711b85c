#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use macho_uuid_formats::{detect_format, FatArchive, MemoryReader, Reader};

fuzz_target!(|data: &[u8]| {
    let reader: Arc<dyn Reader> = Arc::new(MemoryReader::new(data));
    let _ = detect_format(reader.as_ref());

    if !FatArchive::is_fat(reader.as_ref()) {
        return;
    }

    let archive = FatArchive::new(reader, None);
    let _ = archive.architectures();

    if let Ok(members) = archive.members() {
        for member in members {
            // Every surviving slice has a decodable UUID
            assert!(matches!(member.uuid(), Ok(Some(_))));
            let _ = member.cpu_type();
        }
    }
});
