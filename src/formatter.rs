//! Remaining-time labels for the menu bar title and tooltip
//!
//! Labels never report zero while a timed mode is active: any sub-minute
//! remainder (including an already expired one) is shown as "1m".

use crate::constants::MAX_DURATION_MINUTES;
use std::time::{Duration, SystemTime};

/// Convert a user-supplied minute count into a duration
///
/// Returns None for zero or anything above [`MAX_DURATION_MINUTES`].
pub fn duration_from_minutes(minutes: u64) -> Option<Duration> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return None;
    }
    minutes.checked_mul(60).map(Duration::from_secs)
}

/// Remaining time until `end`, clamped to zero when `end` is not in the future
pub fn remaining_interval(end: SystemTime, now: SystemTime) -> Duration {
    end.duration_since(now).unwrap_or(Duration::ZERO)
}

/// Whole minutes remaining, rounded up, never less than one
pub fn minutes_rounded_up(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.div_ceil(60).max(1)
}

/// Compact label for the status bar: "45m", or whole hours ("2h") once an hour or more remains
pub fn short_label(remaining: Duration) -> String {
    let total_minutes = minutes_rounded_up(remaining);
    if total_minutes >= 60 {
        format!("{}h", total_minutes / 60)
    } else {
        format!("{}m", total_minutes)
    }
}

/// Hours and minutes label for tooltips: "1h 12m", "1h" or "25m"
pub fn detailed_label(remaining: Duration) -> String {
    let total_minutes = minutes_rounded_up(remaining);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

pub fn short_label_until(end: SystemTime, now: SystemTime) -> String {
    short_label(remaining_interval(end, now))
}

pub fn detailed_label_until(end: SystemTime, now: SystemTime) -> String {
    detailed_label(remaining_interval(end, now))
}
