use crate::indicator::{IndicatorHandle, IndicatorState};
use crate::tray::{icon, menu};
use anyhow::Result;
use gtk::{self, glib};
use tokio::sync::broadcast;
use tray_icon::menu::{MenuEvent, MenuItem};
use tray_icon::{MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

pub fn create_tray(handle: IndicatorHandle, shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    std::thread::spawn(move || {
        if gtk::init().is_err() {
            log::error!("Failed to initialize GTK");
            return;
        }

        let target = handle.target();
        let (menu, open_item) = match menu::build_menu(&target) {
            Ok(built) => built,
            Err(e) => {
                log::error!("Failed to build menu: {}", e);
                return;
            }
        };

        let state = handle.state();
        let icon = match icon::icon_for(state) {
            Ok(icon) => icon,
            Err(e) => {
                log::error!("Failed to render tray icon: {}", e);
                return;
            }
        };

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(menu::tooltip(state, &target))
            .with_icon(icon)
            .build();

        let tray_icon = match tray_icon {
            Ok(icon) => icon,
            Err(e) => {
                log::error!("Failed to create tray icon: {}", e);
                return;
            }
        };

        setup_event_loop(tray_icon, open_item, handle, shutdown_tx);
        gtk::main();
    });

    Ok(())
}

fn setup_event_loop(
    tray_icon: TrayIcon,
    open_item: MenuItem,
    handle: IndicatorHandle,
    shutdown_tx: broadcast::Sender<()>,
) {
    let menu_receiver = MenuEvent::receiver();
    let click_receiver = TrayIconEvent::receiver();
    let mut state_rx = handle.subscribe();
    let mut target_rx = handle.subscribe_target();

    glib::timeout_add_local(std::time::Duration::from_millis(100), move || {
        let state_changed = state_rx.has_changed().unwrap_or(false);
        if target_rx.has_changed().unwrap_or(false) {
            let target = target_rx.borrow_and_update().clone();
            open_item.set_text(menu::open_label(&target));
            refresh(&tray_icon, *state_rx.borrow_and_update(), &target);
        } else if state_changed {
            let state = *state_rx.borrow_and_update();
            refresh(&tray_icon, state, &target_rx.borrow());
        }

        while let Ok(event) = click_receiver.try_recv() {
            if is_left_click(&event) {
                handle.activate();
            }
        }

        while let Ok(event) = menu_receiver.try_recv() {
            if menu::handle_menu_event(&event.id.0, &handle, &shutdown_tx) {
                gtk::main_quit();
                return glib::ControlFlow::Break;
            }
        }
        glib::ControlFlow::Continue
    });
}

fn refresh(tray_icon: &TrayIcon, state: IndicatorState, target: &str) {
    match icon::icon_for(state) {
        Ok(icon) => {
            if let Err(e) = tray_icon.set_icon(Some(icon)) {
                log::error!("Failed to update tray icon: {}", e);
            }
        }
        Err(e) => log::error!("Failed to render tray icon: {}", e),
    }
    if let Err(e) = tray_icon.set_tooltip(Some(menu::tooltip(state, target))) {
        log::debug!("Failed to update tooltip: {}", e);
    }
}

fn is_left_click(event: &TrayIconEvent) -> bool {
    matches!(
        event,
        TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        }
    )
}
