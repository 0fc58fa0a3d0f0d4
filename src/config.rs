//! Environment overrides for SleepLock
//!
//! The primary configuration source is config.toml (see config_file module).
//! Environment variables (all optional):
//! - SLEEPLOCK_POLL_INTERVAL: Override the expiry timer poll interval (seconds)
//! - SLEEPLOCK_STATE_FILE: Use an alternate state file instead of the standard one

use crate::config_file::Config;
use crate::constants::{POLL_INTERVAL_MAX_SECS, POLL_INTERVAL_MIN_SECS};
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;

pub const POLL_INTERVAL_ENV: &str = "SLEEPLOCK_POLL_INTERVAL";
pub const STATE_FILE_ENV: &str = "SLEEPLOCK_STATE_FILE";

/// Parse the SLEEPLOCK_POLL_INTERVAL environment variable
///
/// Returns Some(seconds) if a valid interval is configured (5-60 seconds)
/// Returns None if not set or invalid
pub fn parse_poll_interval_override() -> Option<u64> {
    match env::var(POLL_INTERVAL_ENV) {
        Ok(val) => match val.trim().parse::<u64>() {
            Ok(seconds) if (POLL_INTERVAL_MIN_SECS..=POLL_INTERVAL_MAX_SECS).contains(&seconds) => {
                info!("Poll interval set via environment variable: {} seconds", seconds);
                Some(seconds)
            }
            Ok(seconds) => {
                warn!(
                    "Invalid poll interval: {} (must be {}-{} seconds). Using config value.",
                    seconds, POLL_INTERVAL_MIN_SECS, POLL_INTERVAL_MAX_SECS
                );
                None
            }
            Err(e) => {
                warn!("Failed to parse {}: {}. Using config value.", POLL_INTERVAL_ENV, e);
                None
            }
        },
        Err(_) => {
            debug!("{} not set.", POLL_INTERVAL_ENV);
            None
        }
    }
}

/// Alternate state file path from SLEEPLOCK_STATE_FILE, if set and non-empty
pub fn state_file_override() -> Option<PathBuf> {
    match env::var_os(STATE_FILE_ENV) {
        Some(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            info!("Using state file from environment: {}", path.display());
            Some(path)
        }
        _ => None,
    }
}

/// Apply environment overrides on top of a loaded config
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(seconds) = parse_poll_interval_override() {
        config.poll_interval_secs = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // All poll interval cases live in one test so parallel tests never race on the variable
    #[test]
    fn test_parse_poll_interval_override() {
        env::set_var(POLL_INTERVAL_ENV, "5");
        assert_eq!(parse_poll_interval_override(), Some(5), "Should accept minimum");

        env::set_var(POLL_INTERVAL_ENV, " 30 ");
        assert_eq!(parse_poll_interval_override(), Some(30), "Whitespace is trimmed");

        env::set_var(POLL_INTERVAL_ENV, "60");
        assert_eq!(parse_poll_interval_override(), Some(60), "Should accept maximum");

        env::set_var(POLL_INTERVAL_ENV, "4");
        assert_eq!(parse_poll_interval_override(), None, "Should reject below 5");

        env::set_var(POLL_INTERVAL_ENV, "61");
        assert_eq!(parse_poll_interval_override(), None, "Should reject above 60");

        env::set_var(POLL_INTERVAL_ENV, "-30");
        assert_eq!(parse_poll_interval_override(), None, "Should reject negative");

        env::set_var(POLL_INTERVAL_ENV, "soon");
        assert_eq!(parse_poll_interval_override(), None, "Should reject non-numeric");

        env::set_var(POLL_INTERVAL_ENV, "20");
        let mut config = Config::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.poll_interval_secs, 20);

        env::set_var(POLL_INTERVAL_ENV, "999");
        let mut config = Config::default();
        apply_env_overrides(&mut config);
        assert_eq!(config.poll_interval_secs, 30, "Invalid override keeps config value");

        env::remove_var(POLL_INTERVAL_ENV);
        assert_eq!(parse_poll_interval_override(), None, "Unset returns None");
    }

    #[test]
    fn test_state_file_override() {
        env::set_var(STATE_FILE_ENV, "/tmp/sleeplock-state-override.toml");
        assert_eq!(
            state_file_override(),
            Some(PathBuf::from("/tmp/sleeplock-state-override.toml"))
        );

        env::set_var(STATE_FILE_ENV, "");
        assert_eq!(state_file_override(), None, "Empty value is ignored");

        env::remove_var(STATE_FILE_ENV);
        assert_eq!(state_file_override(), None);
    }
}
