#![no_main]

use libfuzzer_sys::fuzz_target;

// The DSL parser and reification must never panic on arbitrary input.
fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(set) = binschema::parse(source) {
            for name in set.names().map(str::to_string).collect::<Vec<_>>() {
                let _ = set.make(&name);
            }
        }
    }
});
