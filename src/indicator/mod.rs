mod classify;
mod controller;
mod handle;
mod state;
mod timer;

pub use classify::classify;
pub use controller::{ControllerEvent, IndicatorController, IndicatorOptions, Phase};
pub use handle::IndicatorHandle;
pub use state::IndicatorState;
pub use timer::PollTimer;
