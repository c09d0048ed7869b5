#![no_main]
use libfuzzer_sys::fuzz_target;

use freshgate_engine::rules::{CommandClassifier, PathClassifier};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Split input into a container name and an action text; classification
    // must be total over both.
    let mid = text.len() / 2;
    let Some((container, action)) = text
        .char_indices()
        .nth(mid)
        .map(|(i, _)| text.split_at(i))
    else {
        return;
    };
    let _ = CommandClassifier::new(container).classify(action);
    let path = PathClassifier::new();
    let _ = path.classify(action);
    let _ = path.dashboard_id(action);
});
