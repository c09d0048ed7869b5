use serde::{Deserialize, Serialize};

use freshgate_core::errors::LockError;

/// The restart gate's lock record: a bare epoch timestamp, stored as
/// decimal text. Created or overwritten on every trigger event, read on
/// every gated evaluation, never deleted; staleness is an age comparison,
/// not a removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationStamp {
    /// Seconds since epoch.
    pub timestamp: f64,
}

impl ValidationStamp {
    pub fn new(timestamp: f64) -> Self {
        Self { timestamp }
    }

    /// Serialize to the on-disk form. `{:?}` prints the shortest decimal
    /// that round-trips the f64, so a parse of the output is lossless.
    pub fn to_content(&self) -> String {
        format!("{:?}", self.timestamp)
    }

    /// Parse the on-disk form, tolerating surrounding whitespace.
    pub fn parse(path: &str, content: &str) -> Result<Self, LockError> {
        content
            .trim()
            .parse::<f64>()
            .map(Self::new)
            .map_err(|e| LockError::Corrupt(path.to_string(), e.to_string()))
    }
}

/// The evidence gate's lock record. Write-only from the gate's
/// perspective: `comparison_done` is always written `false` and its
/// consumption contract belongs to an external reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Artifact path, recorded verbatim.
    pub artifact: String,
    /// The gated file the edit targets.
    pub target: String,
    /// Seconds since epoch at decision time.
    pub timestamp: f64,
    pub comparison_done: bool,
}
