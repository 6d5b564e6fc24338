pub mod config;
pub mod indicator;
pub mod paths;
pub mod settings;
pub mod tray;
pub mod window;
