#![no_main]

use libfuzzer_sys::fuzz_target;
use whistle_verification::EngineConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Anything that parses has passed validation and must survive a roundtrip.
    if let Ok(config) = EngineConfig::from_toml_str(text) {
        let again = EngineConfig::from_toml_str(&config.to_toml_string())
            .expect("a validated config re-parses");
        assert_eq!(again.params.quorum_bps, config.params.quorum_bps);
        assert_eq!(again.sweep_interval_secs, config.sweep_interval_secs);
    }
});
