#![no_main]

use libfuzzer_sys::fuzz_target;
use wetodo_core::list::parse_list;

// Loading arbitrary text never panics, and replaying the loaded log again
// reproduces the same entries.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok((mut list, _)) = parse_list("fuzz", text) else {
        return;
    };
    let entries = list.entries().to_vec();
    list.reset();
    assert_eq!(list.entries(), entries.as_slice());

    // A blank title with no users and no log serializes to blank text.
    if let Ok((reloaded, _)) = parse_list("fuzz", &list.to_text()) {
        assert_eq!(reloaded.entries(), list.entries());
    }
});
