pub mod icon;
pub mod menu;
mod platform;

use crate::indicator::IndicatorHandle;
use anyhow::Result;
use tokio::sync::broadcast;

pub struct TrayManager {
    _tray: platform::PlatformTray,
}

impl TrayManager {
    pub fn new(handle: IndicatorHandle, shutdown_tx: broadcast::Sender<()>) -> Result<Self> {
        let tray = platform::create_tray(handle, shutdown_tx)?;
        Ok(Self { _tray: tray })
    }
}
