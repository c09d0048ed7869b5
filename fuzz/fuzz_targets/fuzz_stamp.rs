#![no_main]
use libfuzzer_sys::fuzz_target;

use freshgate_engine::state::ValidationStamp;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(stamp) = ValidationStamp::parse("fuzz", content) {
            // A parsed stamp must round-trip through its on-disk form.
            let reparsed = ValidationStamp::parse("fuzz", &stamp.to_content())
                .expect("serialized stamp must reparse");
            assert!(
                reparsed.timestamp == stamp.timestamp
                    || (reparsed.timestamp.is_nan() && stamp.timestamp.is_nan())
            );
        }
    }
});
