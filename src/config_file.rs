//! Configuration file management
//!
//! This module handles loading and saving the application configuration file,
//! which holds the timer cadence, the menu presets and the quick toggle hotkey.
//! A missing file is not an error: every field has a default.

use crate::constants::{
    ALLOW_SLEEP_PRESETS_DEFAULT_MINUTES, APP_DIR_NAME, KEEP_AWAKE_PRESETS_DEFAULT_MINUTES,
    MAX_DURATION_MINUTES,
    POLL_INTERVAL_DEFAULT_SECS, POLL_INTERVAL_MAX_SECS, POLL_INTERVAL_MIN_SECS,
    POLL_TOLERANCE_SECS, QUICK_TOGGLE_DEFAULT_KEY,
};
use crate::controller::TimerSettings;
use anyhow::{anyhow, bail, Context, Result};
use global_hotkey::hotkey::Code;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration stored in config.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Expiry timer poll interval in seconds (default: 30)
    pub poll_interval_secs: u64,
    /// "Keep awake for" menu entries, in minutes
    pub keep_awake_presets: Vec<u64>,
    /// "Allow sleep in" menu entries, in minutes
    pub allow_sleep_presets: Vec<u64>,
    /// Quick toggle hotkey last key (A-Z, default: K)
    pub quick_toggle_hotkey: Option<String>,
    /// Show a notification when a timed mode runs out
    pub notify_on_expiry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: POLL_INTERVAL_DEFAULT_SECS,
            keep_awake_presets: KEEP_AWAKE_PRESETS_DEFAULT_MINUTES.to_vec(),
            allow_sleep_presets: ALLOW_SLEEP_PRESETS_DEFAULT_MINUTES.to_vec(),
            quick_toggle_hotkey: None,
            notify_on_expiry: true,
        }
    }
}

impl Config {
    /// Get the standard config file path
    ///
    /// - macOS: `~/Library/Application Support/sleeplock/config.toml`
    /// - Linux: `~/.config/sleeplock/config.toml`
    /// - Windows: `%APPDATA%\sleeplock\config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from standard location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Failed to read an existing file
    /// - TOML parsing fails
    /// - A value is out of range (see [`Config::validate`])
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to standard location
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        log::info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Check ranges and formats of every field
    pub fn validate(&self) -> Result<()> {
        if !(POLL_INTERVAL_MIN_SECS..=POLL_INTERVAL_MAX_SECS).contains(&self.poll_interval_secs) {
            bail!(
                "poll_interval_secs must be {}-{} seconds (got {})",
                POLL_INTERVAL_MIN_SECS,
                POLL_INTERVAL_MAX_SECS,
                self.poll_interval_secs
            );
        }

        Self::validate_presets("keep_awake_presets", &self.keep_awake_presets)?;
        Self::validate_presets("allow_sleep_presets", &self.allow_sleep_presets)?;

        if let Some(ref key) = self.quick_toggle_hotkey {
            Self::validate_hotkey(key)
                .with_context(|| format!("Invalid quick_toggle_hotkey: '{}'", key))?;
        }

        Ok(())
    }

    fn validate_presets(name: &str, presets: &[u64]) -> Result<()> {
        if presets.is_empty() {
            bail!("{} must contain at least one entry", name);
        }
        if presets.contains(&0) {
            bail!("{} entries must be at least 1 minute", name);
        }
        if let Some(too_long) = presets.iter().find(|&&m| m > MAX_DURATION_MINUTES) {
            bail!(
                "{} entries must be at most {} minutes (got {})",
                name,
                MAX_DURATION_MINUTES,
                too_long
            );
        }
        Ok(())
    }

    /// Timer cadence for the sleep controller
    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            tolerance: Duration::from_secs(POLL_TOLERANCE_SECS),
        }
    }

    /// Get the quick toggle hotkey Code, defaulting to KeyK if not configured
    pub fn quick_toggle_code(&self) -> Result<Code> {
        let key = self
            .quick_toggle_hotkey
            .as_deref()
            .unwrap_or(QUICK_TOGGLE_DEFAULT_KEY);
        Self::parse_key_string(key)
    }

    /// Validate that a hotkey string is a single letter A-Z (case insensitive)
    pub fn validate_hotkey(key: &str) -> Result<()> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphabetic() => Ok(()),
            (Some(_), None) => Err(anyhow!("Hotkey must be a letter A-Z")),
            _ => Err(anyhow!("Hotkey must be a single character")),
        }
    }

    /// Parse a hotkey string (A-Z) to a Code enum value
    pub fn parse_key_string(key: &str) -> Result<Code> {
        Self::validate_hotkey(key)?;

        let name = format!("Key{}", key.to_ascii_uppercase());
        name.parse::<Code>()
            .map_err(|_| anyhow!("Invalid hotkey: {}", key))
    }
}
