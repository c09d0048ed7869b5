/// Freshness of a persisted precondition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    Fresh,
    Stale(StaleCause),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaleCause {
    /// No record was found (or it could not be read).
    Missing,
    /// The record exists but its age exceeds the window.
    Expired { age_secs: f64, max_secs: u64 },
}

/// Compare a recorded timestamp against a freshness window.
///
/// `age = now - timestamp`. A missing record is stale; an age beyond the
/// window is stale; everything else is fresh, including a timestamp in
/// the future (negative age). The future-timestamp case is intentional:
/// this is a plain elapsed-time check, not clock-skew detection.
pub fn evaluate(timestamp: Option<f64>, max_secs: u64, now: f64) -> Freshness {
    let Some(ts) = timestamp else {
        return Freshness::Stale(StaleCause::Missing);
    };
    let age = now - ts;
    if age > max_secs as f64 {
        Freshness::Stale(StaleCause::Expired {
            age_secs: age,
            max_secs,
        })
    } else {
        Freshness::Fresh
    }
}

/// Whole minutes, truncating. 700 seconds reports as 11 minutes.
pub fn whole_minutes(secs: f64) -> u64 {
    (secs / 60.0) as u64
}
