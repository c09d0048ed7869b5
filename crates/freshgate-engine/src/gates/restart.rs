use std::path::Path;

use freshgate_core::config::GateConfig;
use freshgate_core::types::{ActionClass, Decision, WriteFailurePolicy};

use super::freshness::{self, Freshness};
use super::message;
use crate::rules::CommandClassifier;
use crate::state::{LockStore, ValidationStamp};

/// Restart-precondition gate over shell commands.
///
/// Trigger (config validation) refreshes the stamp and is always allowed.
/// Gated (container restart) is allowed only while the stamp is within the
/// configured window. Everything else passes through.
///
/// Freshness is derived from the stored timestamp on every gated
/// evaluation; there is no cached "validated" flag to invalidate.
pub struct RestartGate<'a> {
    config: &'a GateConfig,
    store: &'a dyn LockStore,
    classifier: CommandClassifier,
}

impl<'a> RestartGate<'a> {
    pub fn new(config: &'a GateConfig, store: &'a dyn LockStore) -> Self {
        Self {
            config,
            store,
            classifier: CommandClassifier::new(&config.container_name),
        }
    }

    /// Decide one command at time `now` (seconds since epoch), reading and
    /// writing the stamp under `root`.
    pub fn decide(&self, root: &Path, command: &str, now: f64) -> Decision {
        match self.classifier.classify(command) {
            ActionClass::Trigger => self.refresh_stamp(root, now),
            ActionClass::Gated => self.check_stamp(root, now),
            ActionClass::PassThrough => Decision::Allow,
        }
    }

    fn refresh_stamp(&self, root: &Path, now: f64) -> Decision {
        let path = self.config.restart_lock_path(root);
        let stamp = ValidationStamp::new(now);
        match self.store.write(&path, &stamp.to_content()) {
            Ok(()) => Decision::Allow,
            Err(_) if self.config.write_failure_policy == WriteFailurePolicy::Open => {
                // Fail-open: the validation itself succeeded, only the
                // stamp is lost. The next restart will be blocked.
                Decision::Allow
            }
            Err(e) => Decision::Deny {
                reason: format!(
                    "Validation ran but its stamp could not be recorded ({e}).\n\
                     Fix the lock location or relax write_failure_policy, then rerun the validation."
                ),
            },
        }
    }

    fn check_stamp(&self, root: &Path, now: f64) -> Decision {
        let path = self.config.restart_lock_path(root);
        // Any read or parse failure counts as "no valid precondition";
        // the operator-visible text does not distinguish the cases.
        let timestamp = self
            .store
            .read(&path)
            .ok()
            .and_then(|content| {
                ValidationStamp::parse(&path.display().to_string(), &content).ok()
            })
            .map(|stamp| stamp.timestamp);

        match freshness::evaluate(timestamp, self.config.restart.lock_timeout_secs, now) {
            Freshness::Fresh => Decision::Allow,
            Freshness::Stale(cause) => Decision::Deny {
                reason: message::restart_denied(&cause, &self.config.container_name),
            },
        }
    }
}
