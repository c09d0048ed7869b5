use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one intercepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    /// The action satisfies a gate's precondition; refreshes the lock.
    Trigger,
    /// The action is only permitted while the precondition is fresh.
    Gated,
    /// The action matches no rule and is allowed unconditionally.
    PassThrough,
}

/// Outcome of one gate evaluation.
///
/// `Deny` always carries a non-empty, human-actionable reason naming the
/// missing precondition and the remedy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    /// Process exit code for the hook contract: allow → 0, deny → 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Decision::Allow => 0,
            Decision::Deny { .. } => 2,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Short label for the decision log.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny { .. } => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "Allow"),
            Decision::Deny { reason } => write!(f, "Deny: {reason}"),
        }
    }
}

/// What to do when a lock write fails during a trigger action.
///
/// `Open` swallows the failure; the triggering action still reports
/// success and only the stamp is lost. `Closed` turns the failure into a
/// deny so a lost stamp cannot masquerade as a satisfied precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    #[default]
    Open,
    Closed,
}

/// Lock persistence strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persistence {
    /// Plain write; a concurrent reader may observe a torn record.
    #[default]
    BestEffort,
    /// Temp-file + fsync + rename behind an advisory lock.
    Atomic,
}
