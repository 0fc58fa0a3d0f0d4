use anyhow::{Context, Result};
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use log::info;

/// Global hotkey that flips the quick toggle (Ctrl+Cmd+Shift+<key>)
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    toggle_hotkey: Option<HotKey>,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        let manager =
            GlobalHotKeyManager::new().context("Failed to create global hotkey manager")?;

        Ok(Self {
            manager,
            toggle_hotkey: None,
        })
    }

    /// Register the quick toggle hotkey
    pub fn register_toggle_hotkey(&mut self, code: Code) -> Result<()> {
        let hotkey = HotKey::new(
            Some(Modifiers::CONTROL | Modifiers::SUPER | Modifiers::SHIFT),
            code,
        );

        self.manager
            .register(hotkey)
            .context("Failed to register quick toggle hotkey")?;

        self.toggle_hotkey = Some(hotkey);
        info!("Quick toggle hotkey registered: Ctrl+Cmd+Shift+{:?}", code);
        Ok(())
    }

    /// Check if a hotkey press is the quick toggle. Key releases never match.
    pub fn is_toggle_press(&self, event: &GlobalHotKeyEvent) -> bool {
        event.state == HotKeyState::Pressed
            && self.toggle_hotkey.is_some_and(|hk| hk.id() == event.id)
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        if let Some(hotkey) = self.toggle_hotkey.take() {
            let _ = self.manager.unregister(hotkey);
        }
    }
}
