//! Centralized constants for SleepLock
//!
//! This module contains all configurable numerical values and persisted keys
//! used throughout the application. Each constant includes documentation on
//! its purpose, unit, and recommended value range.

// ============================================================================
// EXPIRY TIMER
// ============================================================================

/// Default poll interval of the expiry timer while a timed mode is active.
/// Unit: seconds
/// Recommended range: 5-60 (must not exceed the one-minute label granularity)
pub const POLL_INTERVAL_DEFAULT_SECS: u64 = 30;

/// Minimum poll interval accepted from config or environment.
/// Unit: seconds
pub const POLL_INTERVAL_MIN_SECS: u64 = 5;

/// Maximum poll interval accepted from config or environment.
/// Unit: seconds
/// Range: Fixed maximum, the countdown labels have minute granularity
pub const POLL_INTERVAL_MAX_SECS: u64 = 60;

/// Allowed slack when the platform coalesces timer wakeups.
/// Unit: seconds
pub const POLL_TOLERANCE_SECS: u64 = 2;

// ============================================================================
// MENU PRESETS
// ============================================================================

/// Default "Keep awake for" menu presets.
/// Unit: minutes
pub const KEEP_AWAKE_PRESETS_DEFAULT_MINUTES: [u64; 3] = [60, 180, 300];

/// Default "Allow sleep in" menu presets.
/// Unit: minutes
pub const ALLOW_SLEEP_PRESETS_DEFAULT_MINUTES: [u64; 3] = [30, 60, 120];

/// Longest timed mode accepted from a preset or the command line (one week).
/// Unit: minutes
pub const MAX_DURATION_MINUTES: u64 = 7 * 24 * 60;

/// Default quick toggle hotkey letter (used as Ctrl+Cmd+Shift+<letter>).
pub const QUICK_TOGGLE_DEFAULT_KEY: &str = "K";

// ============================================================================
// NOTIFICATION TIMEOUTS
// ============================================================================

/// Standard notification display duration.
/// Unit: milliseconds
/// Recommended range: 2000-5000 (long enough to read, short enough to not annoy)
pub const NOTIFICATION_TIMEOUT_MS: u32 = 3000;

// ============================================================================
// PERSISTED STATE
// ============================================================================

/// Store key holding the persisted mode kind.
pub const MODE_KIND_KEY: &str = "mode.kind";

/// Store key holding the end instant of a timed mode (epoch seconds, float).
pub const MODE_END_KEY: &str = "mode.end";

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "sleeplock";

/// Reason string attached to the stay-awake assertion.
pub const ASSERTION_REASON: &str = "SleepLock keeps the Mac awake";

/// Reverse-DNS identifier reported to the power manager.
pub const APP_REVERSE_DOMAIN: &str = "com.sleeplock.menubar";
