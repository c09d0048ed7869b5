use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use freshgate_core::config::GateConfig;
use freshgate_core::errors::LockError;
use freshgate_core::types::{ActionClass, Decision, WriteFailurePolicy};

use super::message;
use crate::rules::PathClassifier;
use crate::state::{EvidenceRecord, LockStore};

/// Artifact filename convention: `lovelace_before_<suffix>.png`.
const ARTIFACT_PREFIX: &str = "lovelace_before_";
const ARTIFACT_SUFFIX: &str = ".png";

/// Pre-edit evidence gate over target file paths.
///
/// Only dashboard YAML paths are gated. A gated edit requires a capture
/// artifact in the configured directory younger than the window; the
/// newest artifact's filesystem mtime is the precondition timestamp. On
/// success the gate records what it saw (write-only evidence record) and
/// allows.
pub struct EvidenceGate<'a> {
    config: &'a GateConfig,
    store: &'a dyn LockStore,
    classifier: PathClassifier,
}

impl<'a> EvidenceGate<'a> {
    pub fn new(config: &'a GateConfig, store: &'a dyn LockStore) -> Self {
        Self {
            config,
            store,
            classifier: PathClassifier::new(),
        }
    }

    /// Decide one target path at time `now` (seconds since epoch).
    pub fn decide(&self, root: &Path, file_path: &str, now: f64) -> Decision {
        if self.classifier.classify(file_path) != ActionClass::Gated {
            return Decision::Allow;
        }

        let max_age_secs = self.config.evidence.max_artifact_age_minutes * 60;
        let artifact_dir = Path::new(&self.config.evidence.artifact_dir);
        let Some(artifact) = newest_fresh_artifact(artifact_dir, max_age_secs as f64, now) else {
            let dashboard = self.classifier.dashboard_id(file_path);
            return Decision::Deny {
                reason: message::evidence_denied(
                    file_path,
                    &dashboard,
                    &self.config.evidence.capture_tool,
                ),
            };
        };

        self.record_evidence(root, file_path, &artifact, now)
    }

    fn record_evidence(
        &self,
        root: &Path,
        file_path: &str,
        artifact: &Path,
        now: f64,
    ) -> Decision {
        let record = EvidenceRecord {
            artifact: artifact.display().to_string(),
            target: file_path.to_string(),
            timestamp: now,
            comparison_done: false,
        };
        let path = self.config.evidence_lock_path(root);
        let result = serde_json::to_string_pretty(&record)
            .map_err(|e| LockError::Io(path.display().to_string(), e.to_string()))
            .and_then(|content| self.store.write(&path, &content));
        match result {
            Ok(()) => Decision::Allow,
            Err(_) if self.config.write_failure_policy == WriteFailurePolicy::Open => {
                Decision::Allow
            }
            Err(e) => Decision::Deny {
                reason: format!(
                    "A fresh capture exists but its evidence record could not be written ({e}).\n\
                     Fix the lock location or relax write_failure_policy, then retry the edit."
                ),
            },
        }
    }
}

/// Newest artifact in `dir` matching the naming convention, with its mtime
/// in epoch seconds. An unreadable directory is the same as an empty one.
pub fn newest_artifact(dir: &Path) -> Option<(PathBuf, f64)> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name().to_str().is_some_and(|name| {
                name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_SUFFIX)
            })
        })
        .filter_map(|e| {
            let mtime = mtime_epoch_secs(&e.path())?;
            Some((e.path(), mtime))
        })
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

/// The newest artifact, but only if its mtime is within `max_age_secs` of
/// `now`.
fn newest_fresh_artifact(dir: &Path, max_age_secs: f64, now: f64) -> Option<PathBuf> {
    let (path, mtime) = newest_artifact(dir)?;
    if now - mtime > max_age_secs {
        return None;
    }
    Some(path)
}

fn mtime_epoch_secs(path: &Path) -> Option<f64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BestEffortStore;

    const TARGET: &str = "config/lovelace/kitchen_tabs/view.yaml";

    fn config_with_dir(artifact_dir: &Path) -> GateConfig {
        let mut config = GateConfig::default();
        config.evidence.artifact_dir = artifact_dir.display().to_string();
        config
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"png").unwrap();
    }

    fn now_epoch() -> f64 {
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64()
    }

    #[test]
    fn non_dashboard_paths_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_dir(dir.path());
        let gate = EvidenceGate::new(&config, &BestEffortStore);

        assert_eq!(
            gate.decide(dir.path(), "config/automations.yaml", now_epoch()),
            Decision::Allow
        );
        assert_eq!(
            gate.decide(dir.path(), "config/lovelace/readme.md", now_epoch()),
            Decision::Allow
        );
    }

    #[test]
    fn denied_without_artifact_derives_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("shots");
        std::fs::create_dir_all(&artifacts).unwrap();
        let config = config_with_dir(&artifacts);
        let gate = EvidenceGate::new(&config, &BestEffortStore);

        match gate.decide(dir.path(), TARGET, now_epoch()) {
            Decision::Deny { reason } => {
                assert!(reason.contains("BEFORE SCREENSHOT REQUIRED!"));
                assert!(reason.contains("/lovelace/kitchen "));
            }
            Decision::Allow => panic!("expected deny"),
        }
    }

    #[test]
    fn denied_when_artifact_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_dir(&dir.path().join("nope"));
        let gate = EvidenceGate::new(&config, &BestEffortStore);

        assert!(matches!(
            gate.decide(dir.path(), TARGET, now_epoch()),
            Decision::Deny { .. }
        ));
    }

    #[test]
    fn fresh_artifact_allows_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("shots");
        std::fs::create_dir_all(&artifacts).unwrap();
        let artifact = artifacts.join("lovelace_before_1432.png");
        touch(&artifact);

        let config = config_with_dir(&artifacts);
        let gate = EvidenceGate::new(&config, &BestEffortStore);

        assert_eq!(gate.decide(dir.path(), TARGET, now_epoch()), Decision::Allow);

        let record_path = dir.path().join(".freshgate/dashboard_evidence.json");
        let record: EvidenceRecord =
            serde_json::from_str(&std::fs::read_to_string(record_path).unwrap()).unwrap();
        assert_eq!(record.artifact, artifact.display().to_string());
        assert_eq!(record.target, TARGET);
        assert!(!record.comparison_done);
    }

    #[test]
    fn stale_artifact_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("shots");
        std::fs::create_dir_all(&artifacts).unwrap();
        touch(&artifacts.join("lovelace_before_0900.png"));

        let config = config_with_dir(&artifacts);
        let gate = EvidenceGate::new(&config, &BestEffortStore);

        // Evaluate one hour in the future; the 30-minute window has passed.
        let later = now_epoch() + 3600.0;
        assert!(matches!(
            gate.decide(dir.path(), TARGET, later),
            Decision::Deny { .. }
        ));
    }

    #[test]
    fn newest_artifact_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("lovelace_before_0800.png");
        let new = dir.path().join("lovelace_before_0930.png");
        touch(&old);
        touch(&new);

        // Make the first artifact clearly older.
        let past = filetime_from_epoch(now_epoch() - 7200.0);
        set_mtime(&old, past);

        let found = newest_fresh_artifact(dir.path(), 1800.0, now_epoch()).unwrap();
        assert_eq!(found, new);
    }

    #[test]
    fn non_matching_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("lovelace_after_1432.png"));
        touch(&dir.path().join("before_1432.png"));
        touch(&dir.path().join("lovelace_before_1432.jpg"));

        assert!(newest_fresh_artifact(dir.path(), 1800.0, now_epoch()).is_none());
    }

    fn filetime_from_epoch(secs: f64) -> std::time::SystemTime {
        UNIX_EPOCH + std::time::Duration::from_secs_f64(secs)
    }

    fn set_mtime(path: &Path, to: std::time::SystemTime) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(to).unwrap();
    }
}
