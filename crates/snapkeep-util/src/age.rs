//! Relative-age labels for snapshot timestamps.
//!
//! Labels are computed once when a snapshot record is built, so list
//! rendering never has to recompute them per paint.

use chrono::{DateTime, Local};

/// Human-readable relative age of `timestamp` as seen from `now`.
///
/// `now` is a parameter so callers with a fixed clock get deterministic
/// labels.
pub fn age_label(timestamp: DateTime<Local>, now: DateTime<Local>) -> String {
    let delta = now.signed_duration_since(timestamp);
    let secs = delta.num_seconds();

    if secs < 45 {
        // Covers small negative deltas from clock adjustments too.
        return "just now".to_string();
    }
    let mins = delta.num_minutes();
    if mins < 2 {
        return "a minute ago".to_string();
    }
    if mins < 60 {
        return format!("{mins} minutes ago");
    }

    let hours = delta.num_hours();
    if hours == 1 {
        return "an hour ago".to_string();
    }
    if hours < 24 {
        return format!("{hours} hours ago");
    }

    let days = delta.num_days();
    if days == 1 {
        return "yesterday".to_string();
    }
    if days < 7 {
        return format!("{days} days ago");
    }
    if days < 35 {
        let weeks = days / 7;
        if weeks == 1 {
            return "a week ago".to_string();
        }
        return format!("{weeks} weeks ago");
    }

    timestamp.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_just_now() {
        let now = at(2025, 6, 1, 12, 0, 30);
        assert_eq!(age_label(at(2025, 6, 1, 12, 0, 0), now), "just now");
        // Slightly in the future (clock skew) is still "just now".
        assert_eq!(age_label(at(2025, 6, 1, 12, 0, 45), now), "just now");
    }

    #[test]
    fn test_minutes() {
        let now = at(2025, 6, 1, 12, 10, 0);
        assert_eq!(age_label(at(2025, 6, 1, 12, 9, 0), now), "a minute ago");
        assert_eq!(age_label(at(2025, 6, 1, 12, 5, 0), now), "5 minutes ago");
        assert_eq!(age_label(at(2025, 6, 1, 11, 11, 0), now), "59 minutes ago");
    }

    #[test]
    fn test_hours() {
        let now = at(2025, 6, 1, 12, 0, 0);
        assert_eq!(age_label(at(2025, 6, 1, 11, 0, 0), now), "an hour ago");
        assert_eq!(age_label(at(2025, 6, 1, 4, 0, 0), now), "8 hours ago");
    }

    #[test]
    fn test_days_and_weeks() {
        let now = at(2025, 6, 15, 12, 0, 0);
        assert_eq!(age_label(at(2025, 6, 14, 12, 0, 0), now), "yesterday");
        assert_eq!(age_label(at(2025, 6, 12, 12, 0, 0), now), "3 days ago");
        assert_eq!(age_label(at(2025, 6, 8, 12, 0, 0), now), "a week ago");
        assert_eq!(age_label(at(2025, 6, 1, 12, 0, 0), now), "2 weeks ago");
    }

    #[test]
    fn test_old_snapshots_fall_back_to_date() {
        let now = at(2025, 6, 15, 12, 0, 0);
        assert_eq!(age_label(at(2025, 1, 2, 12, 0, 0), now), "2025-01-02");
    }
}
