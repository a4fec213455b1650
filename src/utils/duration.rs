// Countdown and relative-time formatting, plus the period expressions the
// list filters accept

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// Label used once a trashed task has no time left
pub const REMOVING_LABEL: &str = "Removing...";

/// Format the time left before a trashed task is purged
///
/// Leading zero units are dropped but every unit after the first nonzero one is
/// kept, e.g. "expires in 3d 0h 12m 5s", "expires in 42s". A task without a
/// deletion timestamp has no countdown and shows the full retention window.
pub fn format_countdown(remaining: Option<Duration>) -> String {
    let remaining = match remaining {
        Some(remaining) => remaining,
        None => return "30 days left".to_string(),
    };

    if remaining <= Duration::zero() {
        return REMOVING_LABEL.to_string();
    }

    let total_secs = remaining.num_seconds();
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));

    format!("expires in {}", parts.join(" "))
}

/// Format how long ago something happened ("just now", "5 min ago", "2 days ago")
pub fn format_elapsed(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let since = match since {
        Some(since) => since,
        None => return "just now".to_string(),
    };
    let diff = (now - since).max(Duration::zero());

    let days = diff.num_days();
    if days > 0 {
        return format!("{} day{} ago", days, if days > 1 { "s" } else { "" });
    }
    let hours = diff.num_hours();
    if hours > 0 {
        return format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" });
    }
    let minutes = diff.num_minutes();
    if minutes > 0 {
        return format!("{} min ago", minutes);
    }
    "just now".to_string()
}

/// Parse a recency window and return whole days
///
/// Accepts a bare number of days or a number with a `d` (days) or `w` (weeks)
/// suffix: `7`, `7d`, `2w`.
pub fn parse_period(expr: &str) -> Result<u32> {
    let expr = expr.trim();
    let (number, multiplier) = if let Some(n) = expr.strip_suffix('w') {
        (n, 7)
    } else if let Some(n) = expr.strip_suffix('d') {
        (n, 1)
    } else {
        (expr, 1)
    };

    let value: u32 = match number.parse() {
        Ok(value) => value,
        Err(_) => anyhow::bail!("Invalid period: {}. Use days (7, 7d) or weeks (2w).", expr),
    };

    if value == 0 {
        anyhow::bail!("Period must be greater than 0");
    }

    match value.checked_mul(multiplier) {
        Some(days) => Ok(days),
        None => anyhow::bail!("Period is too long: {}", expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_countdown_units() {
        let remaining = Duration::days(3) + Duration::hours(4) + Duration::minutes(12) + Duration::seconds(5);
        assert_eq!(format_countdown(Some(remaining)), "expires in 3d 4h 12m 5s");
        assert_eq!(format_countdown(Some(Duration::days(1))), "expires in 1d 0h 0m 0s");
        assert_eq!(format_countdown(Some(Duration::minutes(2))), "expires in 2m 0s");
        assert_eq!(format_countdown(Some(Duration::seconds(42))), "expires in 42s");
    }

    #[test]
    fn test_format_countdown_boundary() {
        assert_eq!(format_countdown(Some(Duration::zero())), REMOVING_LABEL);
        assert_eq!(format_countdown(Some(Duration::seconds(-5))), REMOVING_LABEL);
        assert_eq!(format_countdown(Some(Duration::milliseconds(1))), "expires in 0s");
        assert_eq!(format_countdown(None), "30 days left");
    }

    #[test]
    fn test_format_elapsed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_elapsed(None, now), "just now");
        assert_eq!(format_elapsed(Some(now - Duration::seconds(30)), now), "just now");
        assert_eq!(format_elapsed(Some(now - Duration::minutes(5)), now), "5 min ago");
        assert_eq!(format_elapsed(Some(now - Duration::hours(1)), now), "1 hour ago");
        assert_eq!(format_elapsed(Some(now - Duration::days(2)), now), "2 days ago");
        assert_eq!(format_elapsed(Some(now + Duration::days(2)), now), "just now");
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("7").unwrap(), 7);
        assert_eq!(parse_period("30d").unwrap(), 30);
        assert_eq!(parse_period("2w").unwrap(), 14);
        assert!(parse_period("0").is_err());
        assert!(parse_period("abc").is_err());
        assert!(parse_period("3m").is_err());
        assert!(parse_period("700000000w").is_err());
        assert_eq!(parse_period("613566756w").unwrap(), 4_294_967_292);
    }
}
