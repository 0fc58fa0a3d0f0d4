use sleeplock::formatter::{
    detailed_label, detailed_label_until, remaining_interval, short_label, short_label_until,
};
use sleeplock::ui::status;
use sleeplock::SleepMode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn now() -> SystemTime {
    UNIX_EPOCH + secs(1_700_000_000)
}

#[test]
fn test_short_label_hours_and_minutes() {
    assert_eq!(short_label(secs(3600)), "1h");
    assert_eq!(short_label(secs(7500)), "2h");
    assert_eq!(short_label(secs(3540)), "59m");
    assert_eq!(short_label(secs(1)), "1m");
}

#[test]
fn test_short_label_rounds_up_into_the_next_hour() {
    // 59m01s is 60 minutes rounded up
    assert_eq!(short_label(secs(3541)), "1h");
}

#[test]
fn test_detailed_label() {
    assert_eq!(detailed_label(secs(4320)), "1h 12m");
    assert_eq!(detailed_label(secs(3600)), "1h");
    assert_eq!(detailed_label(secs(1500)), "25m");
    assert_eq!(detailed_label(secs(10 * 3600 + 60)), "10h 1m");
}

#[test]
fn test_labels_never_show_zero() {
    assert_eq!(short_label(Duration::ZERO), "1m");
    assert_eq!(detailed_label(Duration::ZERO), "1m");
    assert_eq!(detailed_label(Duration::from_millis(1)), "1m");
}

#[test]
fn test_remaining_is_zero_once_end_passed() {
    assert_eq!(remaining_interval(now() - secs(30), now()), Duration::ZERO);
    assert_eq!(remaining_interval(now(), now()), Duration::ZERO);
    assert_eq!(remaining_interval(now() + secs(30), now()), secs(30));
    assert_eq!(short_label_until(now() - secs(600), now()), "1m");
}

#[test]
fn test_eighty_nine_minutes() {
    let end = now() + secs(89 * 60);
    assert_eq!(short_label_until(end, now()), "1h");
    assert_eq!(detailed_label_until(end, now()), "1h 29m");
}

#[test]
fn test_status_text_for_timed_mode() {
    let end = now() + secs(25 * 60);
    let mode = SleepMode::KeepAwakeUntil(end);

    assert_eq!(status::status_title(&mode, now()).as_deref(), Some(" 25m"));
    assert_eq!(status::tooltip(&mode, now()), "Mac will stay awake for 25m");
}
