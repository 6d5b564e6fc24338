use super::controller::ControllerEvent;
use super::IndicatorState;
use tokio::sync::{mpsc, watch};

/// Host-side view of a controller: read the state and target, forward clicks.
#[derive(Clone)]
pub struct IndicatorHandle {
    inbox: mpsc::UnboundedSender<ControllerEvent>,
    state: watch::Receiver<IndicatorState>,
    target: watch::Receiver<String>,
}

impl IndicatorHandle {
    pub(crate) fn new(
        inbox: mpsc::UnboundedSender<ControllerEvent>,
        state: watch::Receiver<IndicatorState>,
        target: watch::Receiver<String>,
    ) -> Self {
        Self { inbox, state, target }
    }

    pub fn state(&self) -> IndicatorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<IndicatorState> {
        self.state.clone()
    }

    /// Name of the application being watched; empty before the first start.
    pub fn target(&self) -> String {
        self.target.borrow().clone()
    }

    pub fn subscribe_target(&self) -> watch::Receiver<String> {
        self.target.clone()
    }

    pub fn activate(&self) {
        if self.inbox.send(ControllerEvent::Activate).is_err() {
            log::debug!("Activation ignored, indicator is gone");
        }
    }

    pub fn shutdown(&self) {
        let _ = self.inbox.send(ControllerEvent::Shutdown);
    }
}
