#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod headless;

use crate::indicator::IndicatorHandle;
use anyhow::Result;
use tokio::sync::broadcast;

pub enum PlatformTray {
    #[cfg(target_os = "linux")]
    Linux,
    #[cfg(not(target_os = "linux"))]
    Headless,
}

#[cfg(target_os = "linux")]
pub fn create_tray(handle: IndicatorHandle, shutdown_tx: broadcast::Sender<()>) -> Result<PlatformTray> {
    linux::create_tray(handle, shutdown_tx)?;
    Ok(PlatformTray::Linux)
}

#[cfg(not(target_os = "linux"))]
pub fn create_tray(handle: IndicatorHandle, _shutdown_tx: broadcast::Sender<()>) -> Result<PlatformTray> {
    headless::create_tray(handle)?;
    Ok(PlatformTray::Headless)
}
