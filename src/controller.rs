//! Sleep mode state machine
//!
//! [`SleepController`] owns the current [`SleepMode`], the stay-awake assertion
//! token and the expiry timer handle. Every mutation goes through `apply`,
//! which releases the previous assertion and timer before the new mode is
//! evaluated, persists the committed mode and notifies the observer once.

use crate::clock::Clock;
use crate::constants::{ASSERTION_REASON, MODE_END_KEY, MODE_KIND_KEY};
use crate::formatter;
use crate::mode::{ModeKind, SleepMode};
use crate::power::{AssertionToken, StayAwake, SystemSleep};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::store::{PersistentStore, StoreChange};
use anyhow::Result;
use log::{debug, info, warn};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Single-subscriber notification of committed mode changes and countdown ticks
pub type ModeObserver = Box<dyn FnMut(&SleepMode)>;

/// Expiry timer cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub interval: Duration,
    pub tolerance: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        use crate::constants::{POLL_INTERVAL_DEFAULT_SECS, POLL_TOLERANCE_SECS};
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_DEFAULT_SECS),
            tolerance: Duration::from_secs(POLL_TOLERANCE_SECS),
        }
    }
}

/// Collaborators the controller drives
pub struct Services {
    pub store: Box<dyn PersistentStore>,
    pub assertion: Box<dyn StayAwake>,
    pub sleeper: Box<dyn SystemSleep>,
    pub scheduler: Box<dyn Scheduler>,
    pub clock: Box<dyn Clock>,
}

pub struct SleepController {
    mode: SleepMode,
    assertion: Option<AssertionToken>,
    timer: Option<TimerHandle>,
    timer_settings: TimerSettings,
    observer: Option<ModeObserver>,
    services: Services,
}

impl SleepController {
    /// Create a controller, restoring the last persisted mode
    ///
    /// A timed mode whose end already passed (or whose record is incomplete)
    /// comes back as `Off`. A live timed mode re-arms the assertion and timer
    /// with its original end instant.
    pub fn restore(services: Services, timer_settings: TimerSettings) -> Self {
        let mut controller = Self {
            mode: SleepMode::Off,
            assertion: None,
            timer: None,
            timer_settings,
            observer: None,
            services,
        };

        let restored = controller.read_persisted_mode();
        info!("Restoring sleep mode: {:?}", restored);
        controller.apply(restored);
        controller
    }

    /// Register the observer, replacing any previous one
    pub fn set_observer(&mut self, observer: impl FnMut(&SleepMode) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn mode(&self) -> SleepMode {
        self.mode
    }

    /// One-bit view of the mode used by the quick toggle
    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    pub fn is_assertion_held(&self) -> bool {
        self.assertion.is_some()
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Handle of the live expiry timer, if a timed mode is active
    pub fn timer_handle(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn turn_off(&mut self) {
        info!("Turning off");
        self.apply(SleepMode::Off);
    }

    pub fn keep_awake_indefinitely(&mut self) {
        info!("Keeping awake until turned off");
        self.apply(SleepMode::KeepAwakeIndefinite);
    }

    /// Keep the system awake for `duration` from now
    pub fn keep_awake(&mut self, duration: Duration) {
        let end = self.end_after(duration);
        self.keep_awake_until(end);
    }

    pub fn keep_awake_until(&mut self, end: SystemTime) {
        info!("Keeping awake until {}", epoch_secs(end));
        self.apply(SleepMode::KeepAwakeUntil(end));
    }

    /// Keep the system awake for `duration`, then ask it to sleep
    pub fn allow_sleep(&mut self, duration: Duration) {
        let end = self.end_after(duration);
        self.allow_sleep_after(end);
    }

    pub fn allow_sleep_after(&mut self, end: SystemTime) {
        info!("Allowing sleep at {}", epoch_secs(end));
        self.apply(SleepMode::AllowSleepAfter(end));
    }

    /// Off becomes indefinitely awake; every other mode turns off
    pub fn toggle_quick(&mut self) {
        match self.mode {
            SleepMode::Off => self.keep_awake_indefinitely(),
            SleepMode::KeepAwakeIndefinite
            | SleepMode::KeepAwakeUntil(_)
            | SleepMode::AllowSleepAfter(_) => self.turn_off(),
        }
    }

    /// Time left in a timed mode, zero once the end has passed
    pub fn remaining_time(&self) -> Option<Duration> {
        let end = self.mode.end_time()?;
        Some(formatter::remaining_interval(end, self.services.clock.now()))
    }

    pub fn remaining_time_short_text(&self) -> Option<String> {
        let end = self.mode.end_time()?;
        Some(formatter::short_label_until(end, self.services.clock.now()))
    }

    pub fn remaining_time_detailed_text(&self) -> Option<String> {
        let end = self.mode.end_time()?;
        Some(formatter::detailed_label_until(end, self.services.clock.now()))
    }

    /// Whether delivering `handle` now would expire the current timed mode
    ///
    /// Lets the caller act (e.g. notify the user) before `handle_tick`
    /// releases the assertion and possibly puts the machine to sleep.
    pub fn tick_expires(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
            && self
                .mode
                .end_time()
                .is_some_and(|end| self.services.clock.now() >= end)
    }

    /// Handle one expiry timer tick
    ///
    /// Ticks for any handle other than the live timer are stale (the timer was
    /// cancelled by a later transition) and do nothing. Returns true when the
    /// tick expired the mode.
    pub fn handle_tick(&mut self, handle: TimerHandle) -> bool {
        if self.timer != Some(handle) {
            debug!("Ignoring stale tick for timer {}", handle.id());
            return false;
        }

        let Some(end) = self.mode.end_time() else {
            self.stop_timer();
            return false;
        };

        if self.services.clock.now() >= end {
            let expired = self.mode;
            info!("Timed mode {} expired", expired.kind());
            self.turn_off();

            if let SleepMode::AllowSleepAfter(_) = expired {
                info!("Requesting system sleep");
                if let Err(e) = self.services.sleeper.request_system_sleep() {
                    warn!("System sleep request failed, ignoring: {:#}", e);
                }
            }
            return true;
        }

        debug!("Tick: {:?} remaining", self.remaining_time());
        self.notify();
        false
    }

    fn end_after(&self, duration: Duration) -> SystemTime {
        let now = self.services.clock.now();
        now.checked_add(duration).unwrap_or_else(|| {
            warn!(
                "Duration {:?} is beyond the representable time range, falling back to off",
                duration
            );
            now
        })
    }

    fn apply(&mut self, requested: SleepMode) {
        // Release the previous timer and assertion before anything else
        self.stop_timer();
        self.stop_assertion();

        let now = self.services.clock.now();
        let mode = match requested.end_time() {
            Some(end) if end <= now => {
                info!("End time is not in the future, falling back to off");
                SleepMode::Off
            }
            _ => requested,
        };

        self.mode = mode;
        match mode {
            SleepMode::Off => {}
            SleepMode::KeepAwakeIndefinite => self.start_assertion(),
            SleepMode::KeepAwakeUntil(_) | SleepMode::AllowSleepAfter(_) => {
                self.start_assertion();
                self.start_timer();
            }
        }

        self.persist_mode();
        self.notify();
    }

    fn start_assertion(&mut self) {
        match self.services.assertion.acquire(ASSERTION_REASON) {
            Ok(token) => self.assertion = Some(token),
            Err(e) => warn!(
                "Could not acquire stay-awake assertion, mode kept anyway: {:#}",
                e
            ),
        }
    }

    fn stop_assertion(&mut self) {
        if let Some(token) = self.assertion.take() {
            self.services.assertion.release(token);
        }
    }

    fn start_timer(&mut self) {
        let TimerSettings { interval, tolerance } = self.timer_settings;
        self.timer = Some(self.services.scheduler.schedule_repeating(interval, tolerance));
    }

    fn stop_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.services.scheduler.cancel(handle);
        }
    }

    fn notify(&mut self) {
        let mode = self.mode;
        if let Some(observer) = self.observer.as_mut() {
            observer(&mode);
        }
    }

    fn persist_mode(&mut self) {
        if let Err(e) = write_mode(self.services.store.as_mut(), &self.mode) {
            warn!("Failed to persist sleep mode: {:#}", e);
        }
    }

    fn read_persisted_mode(&self) -> SleepMode {
        read_mode(self.services.store.as_ref(), self.services.clock.now())
    }
}

impl Drop for SleepController {
    fn drop(&mut self) {
        self.stop_timer();
        self.stop_assertion();
    }
}

/// Record `mode` as `{kind, end?}` in one write; the end key is removed for untimed modes
pub fn write_mode(store: &mut dyn PersistentStore, mode: &SleepMode) -> Result<()> {
    let end = match mode.end_time() {
        Some(end) => StoreChange::SetF64(MODE_END_KEY, epoch_secs(end)),
        None => StoreChange::Remove(MODE_END_KEY),
    };
    store.apply_changes(&[StoreChange::SetString(MODE_KIND_KEY, mode.kind().as_str()), end])
}

/// Decode the persisted mode, treating anything malformed or expired as `Off`
pub fn read_mode(store: &dyn PersistentStore, now: SystemTime) -> SleepMode {
    let kind = match store.get_string(MODE_KIND_KEY) {
        Some(raw) => match raw.parse::<ModeKind>() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("{:#}, treating as off", e);
                ModeKind::Off
            }
        },
        None => ModeKind::Off,
    };

    match kind {
        ModeKind::Off => SleepMode::Off,
        ModeKind::KeepAwakeInfinite => SleepMode::KeepAwakeIndefinite,
        ModeKind::KeepAwakeUntil | ModeKind::AllowSleepAfter => {
            let Some(end) = store.get_f64(MODE_END_KEY).and_then(from_epoch_secs) else {
                debug!("Timed mode {} has no usable end time", kind);
                return SleepMode::Off;
            };
            if end <= now {
                debug!("Timed mode {} already ended", kind);
                return SleepMode::Off;
            }
            kind.with_end(end).unwrap_or(SleepMode::Off)
        }
    }
}

/// Seconds since the Unix epoch as stored under `mode.end`
pub fn epoch_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Inverse of [`epoch_secs`]; rejects non-finite and non-positive values
pub fn from_epoch_secs(secs: f64) -> Option<SystemTime> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let offset = Duration::try_from_secs_f64(secs).ok()?;
    UNIX_EPOCH.checked_add(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::power::RecordingPower;
    use crate::scheduler::ManualScheduler;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t0() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    struct Fixture {
        clock: ManualClock,
        power: RecordingPower,
        scheduler: ManualScheduler,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                clock: ManualClock::new(t0()),
                power: RecordingPower::new(),
                scheduler: ManualScheduler::new(),
            }
        }

        fn controller_with(&self, store: MemoryStore) -> SleepController {
            SleepController::restore(
                Services {
                    store: Box::new(store),
                    assertion: Box::new(self.power.clone()),
                    sleeper: Box::new(self.power.clone()),
                    scheduler: Box::new(self.scheduler.clone()),
                    clock: Box::new(self.clock.clone()),
                },
                TimerSettings::default(),
            )
        }

        fn controller(&self) -> SleepController {
            self.controller_with(MemoryStore::new())
        }
    }

    #[test]
    fn test_switching_modes_never_holds_two_assertions() {
        let fx = Fixture::new();
        let mut controller = fx.controller();

        controller.keep_awake_indefinitely();
        controller.keep_awake(Duration::from_secs(3600));
        controller.allow_sleep(Duration::from_secs(600));
        controller.keep_awake_indefinitely();

        assert_eq!(fx.power.held_count(), 1);
        assert_eq!(fx.power.acquired_count(), 4);
        assert_eq!(fx.power.released_count(), 3);
        assert_eq!(fx.scheduler.active_count(), 0, "Indefinite mode has no timer");
        assert!(!controller.is_timer_active());
    }

    #[test]
    fn test_timed_mode_arms_one_timer_with_configured_interval() {
        let fx = Fixture::new();
        let mut controller = fx.controller();

        controller.keep_awake(Duration::from_secs(3600));
        controller.keep_awake(Duration::from_secs(7200));

        let handles = fx.scheduler.active_handles();
        assert_eq!(handles.len(), 1);
        assert_eq!(Some(handles[0]), controller.timer_handle());
        assert_eq!(
            fx.scheduler.interval_of(handles[0]),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_past_end_commits_off_with_single_notification() {
        let fx = Fixture::new();
        let mut controller = fx.controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        controller.set_observer(move |mode| sink.borrow_mut().push(*mode));

        controller.keep_awake_until(t0() - Duration::from_secs(5));

        assert_eq!(*seen.borrow(), vec![SleepMode::Off]);
        assert_eq!(fx.power.held_count(), 0);
        assert_eq!(fx.scheduler.active_count(), 0);
    }

    #[test]
    fn test_zero_duration_is_off() {
        let fx = Fixture::new();
        let mut controller = fx.controller();
        controller.allow_sleep(Duration::ZERO);
        assert_eq!(controller.mode(), SleepMode::Off);
        assert!(!controller.is_assertion_held());
    }

    #[test]
    fn test_denied_assertion_still_commits_mode() {
        let fx = Fixture::new();
        fx.power.deny_assertions(true);
        let mut controller = fx.controller();

        controller.keep_awake(Duration::from_secs(600));

        assert!(matches!(controller.mode(), SleepMode::KeepAwakeUntil(_)));
        assert!(!controller.is_assertion_held());
        assert!(controller.is_timer_active(), "Expiry still tracked");
    }

    #[test]
    fn test_drop_releases_resources() {
        let fx = Fixture::new();
        {
            let mut controller = fx.controller();
            controller.keep_awake(Duration::from_secs(600));
            assert_eq!(fx.power.held_count(), 1);
        }
        assert_eq!(fx.power.held_count(), 0);
        assert_eq!(fx.scheduler.active_count(), 0);
    }

    #[test]
    fn test_epoch_secs_conversion() {
        let end = t0() + Duration::from_millis(250);
        let secs = epoch_secs(end);
        assert_eq!(secs, 1_700_000_000.25);
        assert_eq!(from_epoch_secs(secs), Some(end));

        assert_eq!(from_epoch_secs(0.0), None);
        assert_eq!(from_epoch_secs(-10.0), None);
        assert_eq!(from_epoch_secs(f64::NAN), None);
        assert_eq!(from_epoch_secs(f64::INFINITY), None);
    }
}
