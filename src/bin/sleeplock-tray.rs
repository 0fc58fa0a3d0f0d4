// SleepLock Tray App - macOS menu bar application for keep-awake timers
// This binary provides a native tray icon with a countdown title and preset menu

use anyhow::{anyhow, Context, Result};
use global_hotkey::GlobalHotKeyEvent;
use log::{error, info, warn};
use parking_lot::Mutex;
use sleeplock::config_file::Config;
use sleeplock::formatter::duration_from_minutes;
use sleeplock::scheduler::{ThreadScheduler, TickSink, TimerHandle};
use sleeplock::ui::hotkeys::HotkeyManager;
use sleeplock::ui::{notifications, status};
use sleeplock::{SleepController, SleepMode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ICON_SIZE: u32 = 32;

/// Everything that wakes the event loop
#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
    Hotkey(GlobalHotKeyEvent),
    Tick(TimerHandle),
}

#[derive(Debug, Clone, Copy)]
enum MenuAction {
    TurnOff,
    KeepAwakeFor(Duration),
    KeepAwakeIndefinitely,
    AllowSleepIn(Duration),
    Quit,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting SleepLock Tray App v{}", VERSION);

    let config = sleeplock::load_config().context("Failed to load configuration")?;

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    // Menu clicks, hotkeys and timer ticks all arrive as user events
    let menu_proxy = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        let _ = menu_proxy.send_event(UserEvent::Menu(event));
    }));
    let hotkey_proxy = event_loop.create_proxy();
    GlobalHotKeyEvent::set_event_handler(Some(move |event| {
        let _ = hotkey_proxy.send_event(UserEvent::Hotkey(event));
    }));
    let tick_proxy = Mutex::new(event_loop.create_proxy());
    let sink: TickSink = Arc::new(move |handle| {
        let _ = tick_proxy.lock().send_event(UserEvent::Tick(handle));
    });

    let mut controller = Some(
        sleeplock::open_controller(&config, Box::new(ThreadScheduler::new(sink)))
            .context("Failed to initialize SleepLock")?,
    );

    let mut _tray: Option<TrayIcon> = None;
    let mut hotkeys: Option<HotkeyManager> = None;
    let mut actions: HashMap<MenuId, MenuAction> = HashMap::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        let Some(ctl) = controller.as_mut() else {
            return;
        };

        match event {
            // The tray icon must be created once the event loop is running
            Event::NewEvents(StartCause::Init) => {
                match build_tray(&config, &mut actions) {
                    Ok(icon) => {
                        update_tray(&icon, &ctl.mode());
                        let observed = icon.clone();
                        ctl.set_observer(move |mode| update_tray(&observed, mode));
                        _tray = Some(icon);
                        info!("Tray icon created, running event loop");
                    }
                    Err(e) => {
                        error!("Failed to create tray icon: {:#}", e);
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                }

                match start_hotkeys(&config) {
                    Ok(manager) => hotkeys = Some(manager),
                    Err(e) => warn!("Quick toggle hotkey unavailable: {:#}", e),
                }
            }
            Event::UserEvent(UserEvent::Menu(event)) => {
                let Some(action) = actions.get(&event.id).copied() else {
                    return;
                };
                if handle_menu_action(ctl, action) {
                    info!("Quit menu item clicked, exiting");
                    ctl.clear_observer();
                    // Release the assertion and timer before the process goes away
                    controller = None;
                    hotkeys = None;
                    _tray = None;
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::UserEvent(UserEvent::Hotkey(event)) => {
                if hotkeys.as_ref().is_some_and(|hk| hk.is_toggle_press(&event)) {
                    info!("Quick toggle hotkey pressed");
                    ctl.toggle_quick();
                }
            }
            Event::UserEvent(UserEvent::Tick(handle)) => {
                // Notify before handling: an expiring sleep timer suspends the machine
                if config.notify_on_expiry && ctl.tick_expires(handle) {
                    notifications::show_expiry_notification(&ctl.mode());
                }
                ctl.handle_tick(handle);
            }
            _ => {}
        }
    });
}

/// Apply a menu selection; returns true when the app should quit
fn handle_menu_action(controller: &mut SleepController, action: MenuAction) -> bool {
    match action {
        MenuAction::TurnOff => controller.turn_off(),
        MenuAction::KeepAwakeFor(duration) => controller.keep_awake(duration),
        MenuAction::KeepAwakeIndefinitely => controller.keep_awake_indefinitely(),
        MenuAction::AllowSleepIn(duration) => controller.allow_sleep(duration),
        MenuAction::Quit => return true,
    }
    false
}

fn build_tray(config: &Config, actions: &mut HashMap<MenuId, MenuAction>) -> Result<TrayIcon> {
    let menu = Menu::new();

    let title_item = MenuItem::new("SleepLock", false, None);
    menu.append(&title_item).context("Failed to add title menu item")?;
    menu.append(&PredefinedMenuItem::separator())
        .context("Failed to add separator")?;

    let off_item = MenuItem::new("Turn Off", true, None);
    menu.append(&off_item).context("Failed to add off menu item")?;
    actions.insert(off_item.id().clone(), MenuAction::TurnOff);
    menu.append(&PredefinedMenuItem::separator())
        .context("Failed to add separator")?;

    let keep_header = MenuItem::new("Keep awake for:", false, None);
    menu.append(&keep_header).context("Failed to add menu header")?;
    for &minutes in &config.keep_awake_presets {
        let Some(duration) = duration_from_minutes(minutes) else {
            warn!("Skipping out-of-range keep awake preset: {} minutes", minutes);
            continue;
        };
        let item = MenuItem::new(status::preset_label(minutes), true, None);
        menu.append(&item).context("Failed to add preset menu item")?;
        actions.insert(item.id().clone(), MenuAction::KeepAwakeFor(duration));
    }
    let indefinite_item = MenuItem::new("Until manually turned off", true, None);
    menu.append(&indefinite_item)
        .context("Failed to add indefinite menu item")?;
    actions.insert(
        indefinite_item.id().clone(),
        MenuAction::KeepAwakeIndefinitely,
    );
    menu.append(&PredefinedMenuItem::separator())
        .context("Failed to add separator")?;

    let sleep_header = MenuItem::new("Allow sleep in:", false, None);
    menu.append(&sleep_header).context("Failed to add menu header")?;
    for &minutes in &config.allow_sleep_presets {
        let Some(duration) = duration_from_minutes(minutes) else {
            warn!("Skipping out-of-range allow sleep preset: {} minutes", minutes);
            continue;
        };
        let item = MenuItem::new(status::preset_label(minutes), true, None);
        menu.append(&item).context("Failed to add preset menu item")?;
        actions.insert(item.id().clone(), MenuAction::AllowSleepIn(duration));
    }
    menu.append(&PredefinedMenuItem::separator())
        .context("Failed to add separator")?;

    let quit_item = MenuItem::new("Quit", true, None);
    menu.append(&quit_item).context("Failed to add quit menu item")?;
    actions.insert(quit_item.id().clone(), MenuAction::Quit);

    TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip(status::tooltip(&SleepMode::Off, SystemTime::now()))
        .with_icon(mode_icon(&SleepMode::Off)?)
        .build()
        .context("Failed to create tray icon")
}

fn start_hotkeys(config: &Config) -> Result<HotkeyManager> {
    let mut manager = HotkeyManager::new()?;
    manager.register_toggle_hotkey(config.quick_toggle_code()?)?;
    Ok(manager)
}

/// Refresh title, tooltip and icon for the current mode
fn update_tray(tray: &TrayIcon, mode: &SleepMode) {
    let now = SystemTime::now();

    tray.set_title(status::status_title(mode, now));
    if let Err(e) = tray.set_tooltip(Some(status::tooltip(mode, now))) {
        error!("Failed to update tray tooltip: {}", e);
    }
    match mode_icon(mode) {
        Ok(icon) => {
            if let Err(e) = tray.set_icon(Some(icon)) {
                error!("Failed to update tray icon: {}", e);
            }
        }
        Err(e) => error!("{:#}", e),
    }
}

/// Filled circle: grey when off, amber while keeping awake, blue before a scheduled sleep
fn mode_icon(mode: &SleepMode) -> Result<Icon> {
    let color = match mode {
        SleepMode::Off => [128, 128, 128, 255],
        SleepMode::KeepAwakeIndefinite | SleepMode::KeepAwakeUntil(_) => [255, 176, 0, 255],
        SleepMode::AllowSleepAfter(_) => [64, 128, 255, 255],
    };

    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 2.0;
    let mut rgba = vec![0u8; (ICON_SIZE * ICON_SIZE * 4) as usize];

    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if dx * dx + dy * dy <= radius * radius {
                let i = ((y * ICON_SIZE + x) * 4) as usize;
                rgba[i..i + 4].copy_from_slice(&color);
            }
        }
    }

    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).map_err(|e| anyhow!("Failed to create icon: {}", e))
}
