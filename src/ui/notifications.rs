use crate::constants::NOTIFICATION_TIMEOUT_MS;
use crate::mode::SleepMode;

/// Notification text for a timed mode that just ran out
pub fn expiry_message(expired: &SleepMode) -> Option<&'static str> {
    match expired {
        SleepMode::KeepAwakeUntil(_) => Some("Keep-awake timer finished. Mac sleeps normally again."),
        SleepMode::AllowSleepAfter(_) => Some("Timer finished. Putting the Mac to sleep."),
        SleepMode::Off | SleepMode::KeepAwakeIndefinite => None,
    }
}

/// Show a notification when a timed mode expires
pub fn show_expiry_notification(expired: &SleepMode) {
    let Some(body) = expiry_message(expired) else {
        return;
    };

    if let Err(e) = notify_rust::Notification::new()
        .summary("SleepLock")
        .body(body)
        .timeout(notify_rust::Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
        .show()
    {
        log::warn!("Failed to show notification: {}", e);
    }
}
