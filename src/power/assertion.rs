use super::{AssertionToken, StayAwake};
use crate::constants::APP_REVERSE_DOMAIN;
use anyhow::{Context, Result};

/// Stay-awake assertion backed by the `keepawake` crate
///
/// Prevents idle and system sleep while held. The display is still allowed to
/// sleep. Dropping the inner guard releases the OS assertion.
#[derive(Default)]
pub struct KeepAwakeAssertion {
    next_token: u64,
    held: Option<(AssertionToken, keepawake::KeepAwake)>,
}

impl KeepAwakeAssertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl StayAwake for KeepAwakeAssertion {
    fn acquire(&mut self, reason: &str) -> Result<AssertionToken> {
        if let Some((token, _)) = self.held.take() {
            log::warn!("Replacing still-held assertion {:?}", token);
        }

        let guard = keepawake::Builder::default()
            .display(false)
            .idle(true)
            .sleep(true)
            .reason(reason)
            .app_name("SleepLock")
            .app_reverse_domain(APP_REVERSE_DOMAIN)
            .create()
            .context("Failed to create stay-awake assertion")?;

        self.next_token += 1;
        let token = AssertionToken(self.next_token);
        self.held = Some((token, guard));
        log::debug!("Stay-awake assertion {:?} acquired", token);
        Ok(token)
    }

    fn release(&mut self, token: AssertionToken) {
        match self.held.take() {
            Some((held, guard)) if held == token => {
                drop(guard);
                log::debug!("Stay-awake assertion {:?} released", token);
            }
            Some(other) => {
                log::warn!("Release of {:?} ignored, {:?} is held", token, other.0);
                self.held = Some(other);
            }
            None => {}
        }
    }
}
