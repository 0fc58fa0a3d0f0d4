//! Platform power management: the stay-awake assertion and the one-shot
//! system sleep request

pub mod assertion;
pub mod sleep;

pub use assertion::KeepAwakeAssertion;
pub use sleep::PlatformSleep;

use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Opaque token for one held stay-awake assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssertionToken(pub(crate) u64);

/// Acquire/release an assertion that keeps the system from idle sleeping
pub trait StayAwake {
    fn acquire(&mut self, reason: &str) -> Result<AssertionToken>;
    fn release(&mut self, token: AssertionToken);
}

/// Ask the OS to put the machine to sleep right now
pub trait SystemSleep {
    fn request_system_sleep(&self) -> Result<()>;
}

/// Calls seen by [`RecordingPower`], in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Acquire,
    Release,
    SleepRequest,
}

/// In-process stand-in for both power seams. Clones share counters, so a test
/// can keep one clone and hand the other to the controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingPower {
    inner: Arc<Mutex<RecordingPowerInner>>,
}

#[derive(Debug, Default)]
struct RecordingPowerInner {
    next_token: u64,
    held: Vec<AssertionToken>,
    events: Vec<PowerEvent>,
    acquired: usize,
    released: usize,
    sleep_requests: usize,
    deny_assertions: bool,
    fail_sleep: bool,
}

impl RecordingPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `acquire` fail, as when the OS refuses the assertion
    pub fn deny_assertions(&self, deny: bool) {
        self.inner.lock().deny_assertions = deny;
    }

    /// Make every following sleep request fail
    pub fn fail_sleep_requests(&self, fail: bool) {
        self.inner.lock().fail_sleep = fail;
    }

    pub fn held_count(&self) -> usize {
        self.inner.lock().held.len()
    }

    pub fn acquired_count(&self) -> usize {
        self.inner.lock().acquired
    }

    pub fn released_count(&self) -> usize {
        self.inner.lock().released
    }

    pub fn sleep_requests(&self) -> usize {
        self.inner.lock().sleep_requests
    }

    /// Successful acquires, effective releases and every sleep request, oldest first
    pub fn events(&self) -> Vec<PowerEvent> {
        self.inner.lock().events.clone()
    }
}

impl StayAwake for RecordingPower {
    fn acquire(&mut self, _reason: &str) -> Result<AssertionToken> {
        let mut inner = self.inner.lock();
        if inner.deny_assertions {
            bail!("Assertion denied");
        }
        inner.next_token += 1;
        let token = AssertionToken(inner.next_token);
        inner.held.push(token);
        inner.acquired += 1;
        inner.events.push(PowerEvent::Acquire);
        Ok(token)
    }

    fn release(&mut self, token: AssertionToken) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.held.iter().position(|t| *t == token) {
            inner.held.remove(pos);
            inner.released += 1;
            inner.events.push(PowerEvent::Release);
        }
    }
}

impl SystemSleep for RecordingPower {
    fn request_system_sleep(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.sleep_requests += 1;
        inner.events.push(PowerEvent::SleepRequest);
        if inner.fail_sleep {
            bail!("No power management connection");
        }
        Ok(())
    }
}
