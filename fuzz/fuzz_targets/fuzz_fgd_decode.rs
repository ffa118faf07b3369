#![no_main]
use fabric_drift::codec::{
    FgdCodec, FileSet, TopologyCodec, CONNECTIONS_FILE, SERVERS_FILE, SWITCHES_FILE,
};
use libfuzzer_sys::fuzz_target;

const EMPTY_SERVERS: &str = "servers: []\n";
const ONE_SWITCH: &str = "fabric: fuzz\nswitches:\n  - id: leaf-1\n    role: leaf\n    model: DS2000\n    ports: 56\n";

/// Fuzz the legacy decoder one file at a time.
///
/// The input replaces each of the three files in turn while the other two
/// hold minimal valid content, so failures are reached past the first file.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let codec = FgdCodec::new();
        let base = [
            (SERVERS_FILE, EMPTY_SERVERS),
            (SWITCHES_FILE, ONE_SWITCH),
            (CONNECTIONS_FILE, "connections: []\n"),
        ];

        for target in [SERVERS_FILE, SWITCHES_FILE, CONNECTIONS_FILE] {
            let files = base.iter().fold(FileSet::new(), |files, (name, text)| {
                files.with(*name, if *name == target { s } else { *text })
            });
            if let Ok(model) = codec.decode(&files) {
                // Anything that decodes must encode and decode to the same model.
                let encoded = codec.encode(&model).expect("encode decoded model");
                assert_eq!(codec.decode(&encoded).expect("re-decode"), model);
            }
        }
    }
});
