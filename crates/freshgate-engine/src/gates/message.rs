//! Deny-text rendering. Gates decide; this module formats the multi-line
//! explanations shown on stderr, each ending with the literal remedial
//! command the operator should run next.

use super::freshness::{whole_minutes, StaleCause};

/// Cause line for a stale restart precondition.
pub fn restart_cause(cause: &StaleCause) -> String {
    match cause {
        StaleCause::Missing => "No config validation found!".to_string(),
        StaleCause::Expired { age_secs, max_secs } => format!(
            "Config validation is {} minutes old (max: {} min)!",
            whole_minutes(*age_secs),
            max_secs / 60
        ),
    }
}

/// Full deny explanation for a blocked restart.
pub fn restart_denied(cause: &StaleCause, container: &str) -> String {
    let banner = "=".repeat(60);
    format!(
        "{banner}\n\
         RESTART BLOCKED - Config not validated!\n\
         {banner}\n\
         {}\n\
         \n\
         Required before restart:\n\
        \x20 docker exec {container} python -m homeassistant \\\n\
        \x20   --script check_config --config /config\n\
         \n\
         Only then is restart allowed.",
        restart_cause(cause)
    )
}

/// Full deny explanation for a dashboard edit without a fresh artifact.
pub fn evidence_denied(file_path: &str, dashboard: &str, capture_tool: &str) -> String {
    let banner = format!("+{}+", "=".repeat(70));
    let shown_path = tail(file_path, 50);
    format!(
        "{banner}\n\
         |  BEFORE SCREENSHOT REQUIRED!                                         |\n\
         {banner}\n\
         |  You want to modify a Lovelace file:\n\
         |  {shown_path}\n\
         |\n\
         |  BEFORE making changes - create screenshot:\n\
         |\n\
         |  python3 {capture_tool} \\\n\
         |    /lovelace/{dashboard} /tmp/lovelace_before_$(date +%H%M).png\n\
         |\n\
         |  AFTER the change: Make NEW screenshot and COMPARE!\n\
         {banner}"
    )
}

/// Last `n` characters of a path, for display in a fixed-width box.
fn tail(s: &str, n: usize) -> &str {
    let len = s.chars().count();
    if len <= n {
        return s;
    }
    let skip = len - n;
    let (idx, _) = s.char_indices().nth(skip).unwrap_or((0, ' '));
    &s[idx..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cause_text() {
        assert_eq!(
            restart_cause(&StaleCause::Missing),
            "No config validation found!"
        );
    }

    #[test]
    fn expired_cause_reports_truncated_minutes() {
        let cause = StaleCause::Expired {
            age_secs: 700.0,
            max_secs: 600,
        };
        assert_eq!(
            restart_cause(&cause),
            "Config validation is 11 minutes old (max: 10 min)!"
        );
    }

    #[test]
    fn restart_denied_contains_remedy() {
        let text = restart_denied(&StaleCause::Missing, "homeassistant");
        assert!(text.contains("RESTART BLOCKED"));
        assert!(text.contains("docker exec homeassistant python -m homeassistant"));
        assert!(text.contains("--script check_config --config /config"));
        assert!(text.contains("Only then is restart allowed."));
    }

    #[test]
    fn evidence_denied_embeds_dashboard_and_tool() {
        let text = evidence_denied(
            "config/lovelace/kitchen_tabs/view.yaml",
            "kitchen",
            "tools/lovelace_screenshot.py",
        );
        assert!(text.contains("BEFORE SCREENSHOT REQUIRED!"));
        assert!(text.contains("/lovelace/kitchen "));
        assert!(text.contains("python3 tools/lovelace_screenshot.py"));
        assert!(text.contains("lovelace_before_$(date +%H%M).png"));
    }

    #[test]
    fn long_paths_are_truncated_for_display() {
        let long = format!("{}/lovelace/kitchen_tabs/view.yaml", "x".repeat(80));
        let text = evidence_denied(&long, "kitchen", "tool.py");
        assert!(!text.contains(&"x".repeat(80)));
        assert!(text.contains("lovelace/kitchen_tabs/view.yaml"));
    }

    #[test]
    fn tail_handles_short_strings() {
        assert_eq!(tail("abc", 50), "abc");
        assert_eq!(tail("abcdef", 3), "def");
    }
}
