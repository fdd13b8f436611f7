//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Format a countdown to a future time.
#[must_use]
pub fn format_countdown(target: DateTime<Utc>) -> String {
    format_countdown_from(target, Utc::now())
}

/// Format the time between `now` and `target`.
#[must_use]
pub fn format_countdown_from(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = target.signed_duration_since(now);

    if duration.num_seconds() <= 0 {
        return "expired".to_string();
    }

    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 24 {
        let days = hours / 24;
        format!("in {days} day{}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else if minutes > 0 {
        format!("in {minutes}m")
    } else {
        let seconds = duration.num_seconds();
        format!("in {seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn countdown_hours() {
        let target = now() + Duration::hours(3) + Duration::minutes(30);
        assert_eq!(format_countdown_from(target, now()), "in 3h 30m");
    }

    #[test]
    fn countdown_days() {
        let target = now() + Duration::days(3);
        assert_eq!(format_countdown_from(target, now()), "in 3 days");
    }

    #[test]
    fn countdown_past_is_expired() {
        let target = now() - Duration::seconds(1);
        assert_eq!(format_countdown_from(target, now()), "expired");
        assert_eq!(format_countdown_from(now(), now()), "expired");
    }

    #[test]
    fn countdown_seconds() {
        let target = now() + Duration::seconds(42);
        assert_eq!(format_countdown_from(target, now()), "in 42s");
    }
}
