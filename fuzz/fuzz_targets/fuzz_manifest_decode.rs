#![no_main]
use fabric_drift::codec::{
    FileSet, ManifestCodec, TopologyCodec, CONNECTIONS_FILE, FABRIC_FILE, SERVERS_FILE,
    SWITCHES_FILE,
};
use libfuzzer_sys::fuzz_target;

const FABRIC: &str = "apiVersion: fabric.topology.io/v1alpha1\nkind: Fabric\nmetadata:\n  name: fuzz\nspec: {}\n";

/// Fuzz the manifest decoder with the input as the switch documents.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let files = FileSet::new()
            .with(FABRIC_FILE, FABRIC)
            .with(SWITCHES_FILE, s)
            .with(SERVERS_FILE, "")
            .with(CONNECTIONS_FILE, "");
        let _ = ManifestCodec::default().decode(&files);
    }
});
