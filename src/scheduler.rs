//! Repeating timers for the expiry check
//!
//! A scheduler never calls into the controller directly. It hands out a
//! [`TimerHandle`] and later delivers that handle back to the owner, which
//! forwards it to [`SleepController::handle_tick`](crate::controller::SleepController::handle_tick).
//! Ticks for a cancelled handle are ignored by the controller, so a late
//! delivery is harmless.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Identifies one armed repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Arm a repeating timer firing every `interval`, allowed to drift by `tolerance`
    fn schedule_repeating(&mut self, interval: Duration, tolerance: Duration) -> TimerHandle;

    /// Stop a timer. Cancelling an unknown or already cancelled handle does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler that never fires on its own. Tests inspect what is armed and
/// deliver ticks by hand. Clones share the same timer table.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualSchedulerInner>>,
}

#[derive(Debug, Default)]
struct ManualSchedulerInner {
    next_id: u64,
    active: HashMap<TimerHandle, Duration>,
    scheduled_count: usize,
    cancelled_count: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of every timer that is armed and not cancelled
    pub fn active_handles(&self) -> Vec<TimerHandle> {
        let mut handles: Vec<_> = self.inner.lock().active.keys().copied().collect();
        handles.sort_by_key(|h| h.0);
        handles
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Interval the given timer was armed with, if it is still active
    pub fn interval_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.inner.lock().active.get(&handle).copied()
    }

    /// Total number of timers ever armed
    pub fn scheduled_count(&self) -> usize {
        self.inner.lock().scheduled_count
    }

    /// Total number of effective cancellations
    pub fn cancelled_count(&self) -> usize {
        self.inner.lock().cancelled_count
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&mut self, interval: Duration, _tolerance: Duration) -> TimerHandle {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let handle = TimerHandle(inner.next_id);
        inner.active.insert(handle, interval);
        inner.scheduled_count += 1;
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut inner = self.inner.lock();
        if inner.active.remove(&handle).is_some() {
            inner.cancelled_count += 1;
        }
    }
}

/// Callback a [`ThreadScheduler`] uses to post a tick back to the owning thread
pub type TickSink = Arc<dyn Fn(TimerHandle) + Send + Sync>;

/// Scheduler backed by one sleeper thread per armed timer
///
/// The thread only posts the handle through `sink` (an event loop proxy or a
/// channel); the tick itself is handled on the thread that owns the controller.
/// Cancelling drops the timer's stop channel, which wakes and ends its thread.
pub struct ThreadScheduler {
    sink: TickSink,
    next_id: u64,
    timers: HashMap<TimerHandle, Sender<()>>,
}

impl ThreadScheduler {
    pub fn new(sink: TickSink) -> Self {
        Self {
            sink,
            next_id: 0,
            timers: HashMap::new(),
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&mut self, interval: Duration, tolerance: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let sink = self.sink.clone();

        let spawned = thread::Builder::new()
            .name(format!("expiry-timer-{}", handle.0))
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sink(handle),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(_) => {
                log::debug!(
                    "Timer {} armed: every {:?} (tolerance {:?})",
                    handle.0,
                    interval,
                    tolerance
                );
                self.timers.insert(handle, stop_tx);
            }
            Err(e) => {
                // The controller still treats the timer as armed; expiry is
                // caught on the next user action or restart instead.
                log::error!("Failed to spawn expiry timer thread: {}", e);
            }
        }

        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(stop_tx) = self.timers.remove(&handle) {
            let _ = stop_tx.send(());
            log::debug!("Timer {} cancelled", handle.0);
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        for (_, stop_tx) in self.timers.drain() {
            let _ = stop_tx.send(());
        }
    }
}
