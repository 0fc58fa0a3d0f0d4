//! Tray-facing helpers: status text, notifications and the quick toggle hotkey

pub mod hotkeys;
pub mod notifications;
pub mod status;
