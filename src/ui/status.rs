//! Text shown in the menu bar for the current mode

use crate::formatter;
use crate::mode::SleepMode;
use std::time::SystemTime;

/// Title next to the tray icon: the short countdown for timed modes, nothing otherwise
pub fn status_title(mode: &SleepMode, now: SystemTime) -> Option<String> {
    mode.end_time()
        .map(|end| format!(" {}", formatter::short_label_until(end, now)))
}

pub fn tooltip(mode: &SleepMode, now: SystemTime) -> String {
    match mode {
        SleepMode::Off => "SleepLock off — Mac sleeps normally".to_string(),
        SleepMode::KeepAwakeIndefinite => "SleepLock active — Mac will stay awake".to_string(),
        SleepMode::KeepAwakeUntil(end) => format!(
            "Mac will stay awake for {}",
            formatter::detailed_label_until(*end, now)
        ),
        SleepMode::AllowSleepAfter(end) => format!(
            "Mac will be allowed to sleep in {}",
            formatter::detailed_label_until(*end, now)
        ),
    }
}

/// Menu entry label for a preset given in minutes: "30 min", "1 hour", "3 hours", "1h 30m"
pub fn preset_label(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{} min", m),
        (1, 0) => "1 hour".to_string(),
        (h, 0) => format!("{} hours", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
