//! # Review Helpers
//!
//! Rating aggregation and the relative dates shown next to each review.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Formats an age in seconds as "3 days ago", "1 week ago", "Just now".
///
/// ## Example
/// ```rust
/// use foodie_core::review::format_time_ago;
///
/// assert_eq!(format_time_ago(30), "Just now");
/// assert_eq!(format_time_ago(60), "1 minute ago");
/// assert_eq!(format_time_ago(3 * 86_400), "3 days ago");
/// ```
pub fn format_time_ago(seconds: i64) -> String {
    let units = [(WEEK, "week"), (DAY, "day"), (HOUR, "hour"), (MINUTE, "minute")];

    for (size, name) in units {
        let count = seconds / size;
        if count > 0 {
            let plural = if count > 1 { "s" } else { "" };
            return format!("{count} {name}{plural} ago");
        }
    }

    "Just now".to_string()
}

/// Relative date of `created_at` as seen at `now`.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_time_ago((now - created_at).num_seconds())
}

/// Mean rating rounded to one decimal, 0.0 when there are none.
///
/// ## Example
/// ```rust
/// use foodie_core::review::average_rating;
///
/// assert_eq!(average_rating(&[5, 4, 4]), 4.3);
/// assert_eq!(average_rating(&[]), 0.0);
/// ```
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: i64 = ratings.iter().sum();
    round_rating(sum as f64 / ratings.len() as f64)
}

/// Rounds a rating to one decimal place.
pub fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

// =============================================================================
// Unit Tests
// =============================================================================
