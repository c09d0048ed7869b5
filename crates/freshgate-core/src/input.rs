use serde::Deserialize;
use serde_json::Value;

/// One hook payload: a single JSON object on stdin per invocation.
///
/// Anything that does not parse into this shape is not an error: the
/// contract for unrecognizable input is default-allow, so callers map a
/// failed parse to "nothing to evaluate".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_input: ToolInput,

    /// Optional per-invocation configuration overlay.
    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub file_path: Option<String>,
}

impl HookInput {
    /// Parse a raw stdin payload. Malformed JSON or a non-object yields
    /// `None` (default-allow), never an error.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// The shell command carried by this payload, if any and non-empty.
    pub fn command(&self) -> Option<&str> {
        self.tool_input
            .command
            .as_deref()
            .filter(|c| !c.is_empty())
    }

    /// The target file path carried by this payload, if any and non-empty.
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
    }
}
