//! External window-manager collaborators.
//!
//! The indicator only needs two things from the window manager: the raw
//! window listing and a way to raise a window by name. Both are expressed
//! as traits so the controller can be driven by scripted implementations.

pub mod wmctrl;

pub use wmctrl::WmctrlTool;

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("window listing tool not found: {0}")]
    ToolNotFound(String),
    #[error("window listing failed: {0}")]
    InvocationFailed(String),
    #[error("window listing produced no output")]
    NoOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("window activation tool not found: {0}")]
    ToolNotFound(String),
    #[error("window activation failed: {0}")]
    InvocationFailed(String),
}

pub trait WindowProbe: Send + Sync + 'static {
    /// Cheap check that the listing tool can be invoked at all.
    fn is_available(&self) -> bool;

    /// Returns the listing text, one window per line.
    fn list_windows(&self) -> impl Future<Output = Result<String, ProbeError>> + Send;
}

pub trait Activator: Send + Sync + 'static {
    fn activate(&self, target: &str) -> impl Future<Output = Result<(), ActivationError>> + Send;
}
