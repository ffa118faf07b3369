#![no_main]
use fabric_drift::codec::resources_from_text;
use fabric_drift::diff::DiffEngine;
use libfuzzer_sys::fuzz_target;

/// Fuzz multi-document parsing; whatever parses must diff clean against itself.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(resources) = resources_from_text("fuzz.yaml", s) {
            assert!(DiffEngine::new().compare(&resources, &resources).is_empty());
        }
    }
});
