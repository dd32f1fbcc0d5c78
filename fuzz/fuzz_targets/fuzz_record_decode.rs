#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding untrusted bytes must never panic.
    let _ = bincode::deserialize::<whistle_verification::AuditEntry>(data);
    let _ = bincode::deserialize::<whistle_verification::VerificationSession>(data);
    let _ = bincode::deserialize::<whistle_types::CommitHash>(data);
    let _ = bincode::deserialize::<whistle_types::EngineParams>(data);

    if let Ok(entries) = bincode::deserialize::<Vec<whistle_verification::AuditEntry>>(data) {
        let _ = whistle_verification::audit::verify_entries(&entries);
    }
});
