use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Append a decision entry to the log file, maintaining a hash chain.
///
/// Each entry gets a `prev_hash` field containing the SHA-256 of the
/// previous line ("genesis" for the first) and an RFC3339 `ts`. This is a
/// diagnostic channel only: gate paths append best-effort and a failure
/// here never changes a decision.
pub fn append_entry(path: &Path, entry: &serde_json::Value) -> Result<String> {
    let content = if path.exists() {
        std::fs::read_to_string(path).unwrap_or_default()
    } else {
        String::new()
    };

    let prev_hash = content
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| format!("sha256:{:x}", Sha256::digest(line.as_bytes())))
        .unwrap_or_else(|| "genesis".to_string());

    let mut entry = entry.clone();
    if let Some(obj) = entry.as_object_mut() {
        obj.insert("prev_hash".into(), serde_json::Value::String(prev_hash));
        obj.insert(
            "ts".into(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }

    let entry_json = serde_json::to_string(&entry)?;
    let hash = format!("sha256:{:x}", Sha256::digest(entry_json.as_bytes()));

    let mut new_content = content;
    new_content.push_str(&entry_json);
    new_content.push('\n');
    std::fs::write(path, new_content)
        .with_context(|| format!("cannot write decision log {}", path.display()))?;

    Ok(hash)
}

/// Verify the hash chain in a decision log. Returns the entry count.
pub fn verify_chain(path: &Path) -> Result<u64> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read decision log {}", path.display()))?;

    let mut count = 0u64;
    let mut prev_hash = "genesis".to_string();

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("invalid JSON at line {}", i + 1))?;

        let entry_prev = entry
            .get("prev_hash")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("genesis");

        if entry_prev != prev_hash {
            bail!(
                "hash chain broken at entry {}: expected prev_hash '{}', got '{}'",
                count,
                prev_hash,
                entry_prev
            );
        }

        prev_hash = format!("sha256:{:x}", Sha256::digest(line.as_bytes()));
        count += 1;
    }

    Ok(count)
}

/// Build the standard entry shape for one gate decision.
pub fn decision_entry(gate: &str, action: &str, decision_label: &str) -> serde_json::Value {
    serde_json::json!({
        "gate": gate,
        "action": action,
        "decision": decision_label,
    })
}
