#![no_main]
use libfuzzer_sys::fuzz_target;

use freshgate_core::config::GateConfig;
use freshgate_core::input::HookInput;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    // Parse must never panic; malformed payloads are default-allow.
    let Some(input) = HookInput::parse(raw) else {
        return;
    };
    // Applying an arbitrary overlay must leave a valid config behind.
    if let Some(overlay) = &input.config {
        let mut cfg = GateConfig::default();
        cfg.apply_overlay(overlay);
        assert!(cfg.restart.lock_timeout_secs > 0);
    }
});
