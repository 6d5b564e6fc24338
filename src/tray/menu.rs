use crate::indicator::{IndicatorHandle, IndicatorState};
use anyhow::Result;
use tokio::sync::broadcast;
use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem};

const OPEN_ID: &str = "__open__";
const QUIT_ID: &str = "__quit__";
const APP_NAME: &str = "Unread Tray";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    Quit,
}

impl MenuAction {
    pub fn from_id(event_id: &str) -> Option<Self> {
        match event_id {
            OPEN_ID => Some(MenuAction::Open),
            QUIT_ID => Some(MenuAction::Quit),
            _ => None,
        }
    }
}

/// Builds the tray menu and returns it with the "Open" item, whose label
/// follows the target.
pub fn build_menu(target: &str) -> Result<(Menu, MenuItem)> {
    let menu = Menu::new();
    let open_item = MenuItem::with_id(OPEN_ID, open_label(target), true, None);
    menu.append(&open_item)?;
    menu.append(&PredefinedMenuItem::separator())?;
    menu.append(&MenuItem::with_id(QUIT_ID, "Quit", true, None))?;
    Ok((menu, open_item))
}

pub fn open_label(target: &str) -> String {
    if target.trim().is_empty() {
        return "Open Chat Window".to_string();
    }
    format!("Open {}", target)
}

pub fn tooltip(state: IndicatorState, target: &str) -> String {
    let name = if target.trim().is_empty() { APP_NAME } else { target };
    match state {
        IndicatorState::Read => name.to_string(),
        IndicatorState::Unread => format!("{}: unread activity", name),
    }
}

/// Returns true when the tray should shut down.
pub fn handle_menu_event(
    event_id: &str,
    handle: &IndicatorHandle,
    shutdown_tx: &broadcast::Sender<()>,
) -> bool {
    log::debug!("Menu event: {}", event_id);

    match MenuAction::from_id(event_id) {
        Some(MenuAction::Open) => {
            handle.activate();
            false
        }
        Some(MenuAction::Quit) => {
            log::info!("Quitting application");
            let _ = shutdown_tx.send(());
            true
        }
        None => {
            log::warn!("No route found for menu event: {}", event_id);
            false
        }
    }
}
