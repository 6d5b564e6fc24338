use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use unread_tray::config::Config;
use unread_tray::indicator::{IndicatorController, IndicatorOptions};
use unread_tray::paths;
use unread_tray::settings::{FileSettings, TARGET_APP_NAME_KEY};
use unread_tray::tray::TrayManager;
use unread_tray::window::WmctrlTool;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting Unread Tray...");

    let config = Config::load()?;
    let defaults = HashMap::from([(
        TARGET_APP_NAME_KEY.to_string(),
        config.default_target_app_name.clone(),
    )]);
    let settings = Arc::new(FileSettings::open(paths::settings_path()?, defaults)?);
    let wmctrl = Arc::new(WmctrlTool::from_config(&config));

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let options = IndicatorOptions {
        poll_interval: config.poll_interval(),
        ..IndicatorOptions::default()
    };
    let mut controller = IndicatorController::new(wmctrl.clone(), wmctrl, settings, options);
    controller.start().context("Failed to start indicator")?;
    let handle = controller.handle();
    let indicator = tokio::spawn(controller.run(shutdown_tx.subscribe()));

    let _tray = TrayManager::new(handle, shutdown_tx.clone())?;

    log::info!("Unread Tray started successfully");

    tokio::select! {
        _ = shutdown_rx.recv() => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted");
            let _ = shutdown_tx.send(());
        }
    }

    indicator.await.ok();
    log::info!("Shutdown signal received, exiting...");
    Ok(())
}
