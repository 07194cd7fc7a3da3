#![no_main]

use libfuzzer_sys::fuzz_target;
use wetodo_core::Modification;

// Anything that parses must write back out byte-for-byte.
fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(modification) = Modification::parse_line(line) {
        let canonical = line.trim_end_matches('\n').trim_end_matches('\r');
        assert_eq!(modification.to_string(), canonical);
    }
});
