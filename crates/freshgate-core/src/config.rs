use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConfigError;
use crate::types::{Persistence, WriteFailurePolicy};

/// Dot-directory holding workspace configuration and the evidence lock.
pub const CONFIG_DIR: &str = ".freshgate";
pub const CONFIG_FILE: &str = "config.json";

/// Configuration for both gates, constructed once per invocation and passed
/// by parameter to every component.
///
/// Every field has a built-in default; a missing, unreadable, or invalid
/// config file degrades to `GateConfig::default()` and is never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default)]
    pub write_failure_policy: WriteFailurePolicy,

    #[serde(default)]
    pub persistence: Persistence,

    #[serde(default)]
    pub restart: RestartConfig,

    #[serde(default)]
    pub evidence: EvidenceConfig,
}

/// Restart gate: config-validation stamp freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Maximum stamp age in seconds before a restart is blocked again.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Stamp location, relative to the project root unless absolute.
    #[serde(default = "default_restart_lock_file")]
    pub lock_file: String,
}

/// Evidence gate: dashboard artifact freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Directory scanned for `lovelace_before_*.png` artifacts.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Maximum artifact age in minutes.
    #[serde(default = "default_max_artifact_age_minutes")]
    pub max_artifact_age_minutes: u64,

    /// Capture command suggested in the deny remedy.
    #[serde(default = "default_capture_tool")]
    pub capture_tool: String,

    /// Evidence record location, relative to the project root unless absolute.
    #[serde(default = "default_evidence_lock_file")]
    pub lock_file: String,
}

fn default_container_name() -> String {
    "homeassistant".to_string()
}

fn default_lock_timeout_secs() -> u64 {
    600
}

fn default_restart_lock_file() -> String {
    ".config_validated".to_string()
}

fn default_artifact_dir() -> String {
    "/tmp".to_string()
}

fn default_max_artifact_age_minutes() -> u64 {
    30
}

fn default_capture_tool() -> String {
    "tools/lovelace_screenshot.py".to_string()
}

fn default_evidence_lock_file() -> String {
    format!("{CONFIG_DIR}/dashboard_evidence.json")
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            container_name: default_container_name(),
            write_failure_policy: WriteFailurePolicy::default(),
            persistence: Persistence::default(),
            restart: RestartConfig::default(),
            evidence: EvidenceConfig::default(),
        }
    }
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: default_lock_timeout_secs(),
            lock_file: default_restart_lock_file(),
        }
    }
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            max_artifact_age_minutes: default_max_artifact_age_minutes(),
            capture_tool: default_capture_tool(),
            lock_file: default_evidence_lock_file(),
        }
    }
}

impl GateConfig {
    /// Load from `<root>/.freshgate/config.json`, degrading to defaults on
    /// any failure.
    pub fn load(root: &Path) -> Self {
        Self::from_file(&root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit file, degrading to defaults on any failure.
    pub fn from_file(path: &Path) -> Self {
        read_config(path).unwrap_or_default().sanitized()
    }

    /// Apply a per-invocation JSON overlay (from the hook payload) on top
    /// of this config. Overlay fields take precedence; an overlay that does
    /// not deserialize back into a valid config leaves `self` unchanged.
    pub fn apply_overlay(&mut self, overlay: &Value) {
        let Ok(base) = serde_json::to_value(&*self) else {
            return;
        };
        let merged = merge_values(&base, overlay);
        if let Ok(cfg) = serde_json::from_value::<GateConfig>(merged) {
            *self = cfg.sanitized();
        }
    }

    /// Replace non-positive freshness windows with their defaults.
    fn sanitized(mut self) -> Self {
        if self.restart.lock_timeout_secs == 0 {
            self.restart.lock_timeout_secs = default_lock_timeout_secs();
        }
        if self.evidence.max_artifact_age_minutes == 0 {
            self.evidence.max_artifact_age_minutes = default_max_artifact_age_minutes();
        }
        self
    }

    /// Stamp path for the restart gate.
    pub fn restart_lock_path(&self, root: &Path) -> PathBuf {
        resolve_path(root, &self.restart.lock_file)
    }

    /// Evidence record path for the evidence gate.
    pub fn evidence_lock_path(&self, root: &Path) -> PathBuf {
        resolve_path(root, &self.evidence.lock_file)
    }
}

fn read_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Unreadable(shown.clone(), e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(shown, e.to_string()))
}

fn resolve_path(root: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

/// Recursive JSON merge: overlay objects merge key-by-key, anything else
/// from the overlay replaces the base value.
fn merge_values(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            let mut result = base_obj.clone();
            for (key, value) in overlay_obj {
                let merged = match result.get(key) {
                    Some(existing) => merge_values(existing, value),
                    None => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }
        (_, other) => other.clone(),
    }
}

/// Find the project root: walk up from `start` to the first directory
/// containing `.freshgate/`, falling back to `start` itself.
pub fn discover_root(start: &Path) -> PathBuf {
    let mut dir = start;
    loop {
        if dir.join(CONFIG_DIR).is_dir() {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start.to_path_buf(),
        }
    }
}
