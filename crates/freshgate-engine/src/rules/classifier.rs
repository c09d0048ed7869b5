use regex::Regex;

use freshgate_core::types::ActionClass;

/// Classifies shell commands for the restart gate.
///
/// Evaluation order:
/// 1. Trigger patterns (config validation against the container)
/// 2. Gated patterns (restart of the container)
/// 3. Everything else passes through
///
/// First match wins. All matching is case-insensitive substring search over
/// the full command text; the configured container name is escaped before
/// interpolation so identifiers with regex metacharacters stay literal.
/// Pure function of (command text, container name); no side effects.
pub struct CommandClassifier {
    trigger: Vec<Regex>,
    gated: Vec<Regex>,
}

impl CommandClassifier {
    pub fn new(container_name: &str) -> Self {
        let container = regex::escape(container_name);
        let trigger = [
            format!(r"(?i)docker exec.*{container}.*check_config"),
            format!(r"(?i)docker exec.*{container}.*--script\s+check"),
        ];
        let gated = [
            format!(r"(?i)docker restart\s+{container}"),
            format!(r"(?i)docker restart\s+.*{container}"),
        ];
        Self {
            trigger: compile(&trigger),
            gated: compile(&gated),
        }
    }

    pub fn classify(&self, command: &str) -> ActionClass {
        if self.trigger.iter().any(|re| re.is_match(command)) {
            return ActionClass::Trigger;
        }
        if self.gated.iter().any(|re| re.is_match(command)) {
            return ActionClass::Gated;
        }
        ActionClass::PassThrough
    }
}

/// Classifies target file paths for the evidence gate.
///
/// Only paths under a `lovelace/` segment with a `.yaml` extension are
/// gated; the gate has no trigger action (its precondition is satisfied by
/// artifact capture outside the hook).
pub struct PathClassifier {
    marker: String,
    extension: String,
}

impl PathClassifier {
    pub fn new() -> Self {
        Self {
            marker: "lovelace/".to_string(),
            extension: ".yaml".to_string(),
        }
    }

    pub fn classify(&self, path: &str) -> ActionClass {
        if path.contains(&self.marker) && path.ends_with(&self.extension) {
            ActionClass::Gated
        } else {
            ActionClass::PassThrough
        }
    }

    /// Derive the dashboard identifier from a gated path: the text between
    /// the `lovelace/` marker and the next separator, with a trailing
    /// `_tabs` stripped. Paths without the marker map to `default`.
    pub fn dashboard_id(&self, path: &str) -> String {
        let Some((_, rest)) = path.split_once(&self.marker) else {
            return "default".to_string();
        };
        let segment = rest.split('/').next().unwrap_or(rest);
        segment
            .strip_suffix("_tabs")
            .unwrap_or(segment)
            .to_string()
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[String]) -> Vec<Regex> {
    // Patterns are built above from escaped identifiers and always compile;
    // a pattern that somehow does not is skipped rather than unwrapped.
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}
