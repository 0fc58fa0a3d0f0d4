// Library interface for SleepLock
// This allows tests and both binaries to share the sleep controller

pub mod clock;
pub mod config;
pub mod config_file;
pub mod constants;
pub mod controller;
pub mod formatter;
pub mod mode;
pub mod power;
pub mod scheduler;
pub mod store;
pub mod ui;

pub use controller::{ModeObserver, Services, SleepController, TimerSettings};
pub use mode::{ModeKind, SleepMode};

use anyhow::Result;
use clock::SystemClock;
use config_file::Config;
use log::info;
use power::{KeepAwakeAssertion, PlatformSleep};
use scheduler::Scheduler;
use std::path::PathBuf;
use store::TomlStore;

/// State file location: SLEEPLOCK_STATE_FILE if set, otherwise the standard path
pub fn state_file_path() -> Result<PathBuf> {
    match config::state_file_override() {
        Some(path) => Ok(path),
        None => TomlStore::default_path(),
    }
}

/// Wire the production collaborators and restore the last persisted mode
///
/// The scheduler is supplied by the caller because only the caller knows how
/// ticks get back onto its thread (tray event loop proxy, CLI channel).
pub fn open_controller(config: &Config, scheduler: Box<dyn Scheduler>) -> Result<SleepController> {
    let store = TomlStore::open(state_file_path()?);
    info!("Using state file: {}", store.path().display());

    let services = Services {
        store: Box::new(store),
        assertion: Box::new(KeepAwakeAssertion::new()),
        sleeper: Box::new(PlatformSleep),
        scheduler,
        clock: Box::new(SystemClock),
    };

    Ok(SleepController::restore(services, config.timer_settings()))
}

/// Load config.toml (or defaults) and apply environment overrides
pub fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config::apply_env_overrides(&mut config);
    Ok(config)
}
