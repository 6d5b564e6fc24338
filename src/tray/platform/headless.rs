use crate::indicator::IndicatorHandle;
use crate::tray::menu;
use anyhow::Result;

/// No status area to draw into; state and target changes are only logged.
pub fn create_tray(handle: IndicatorHandle) -> Result<()> {
    log::warn!("No tray surface on this platform, running headless");

    let mut state_rx = handle.subscribe();
    let mut target_rx = handle.subscribe_target();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = state_rx.changed() => if changed.is_err() { break },
                changed = target_rx.changed() => if changed.is_err() { break },
            }
            let state = *state_rx.borrow_and_update();
            let target = target_rx.borrow_and_update().clone();
            log::info!("{}", menu::tooltip(state, &target));
        }
    });

    Ok(())
}
