use super::classify::classify;
use super::handle::IndicatorHandle;
use super::timer::PollTimer;
use super::IndicatorState;
use crate::settings::{SettingsError, SettingsStore, SubscriptionId, TARGET_APP_NAME_KEY};
use crate::window::{ActivationError, Activator, ProbeError, WindowProbe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Debug, Clone)]
pub struct IndicatorOptions {
    pub poll_interval: Duration,
    pub settings_key: String,
}

impl Default for IndicatorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            settings_key: TARGET_APP_NAME_KEY.to_string(),
        }
    }
}

/// Everything that reaches the controller goes through its inbox.
///
/// Events produced by a run of the controller carry that run's generation;
/// anything from an earlier run is dropped on arrival.
#[derive(Debug)]
pub enum ControllerEvent {
    Tick {
        generation: u64,
    },
    ProbeCompleted {
        generation: u64,
        seq: u64,
        target: Arc<str>,
        result: Result<String, ProbeError>,
    },
    TargetChanged {
        generation: u64,
        name: String,
    },
    Activate,
    ActivationCompleted {
        target: Arc<str>,
        result: Result<(), ActivationError>,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Running,
}

pub struct IndicatorController<P: WindowProbe, A: Activator, S: SettingsStore> {
    probe: Arc<P>,
    activator: Arc<A>,
    settings: Arc<S>,
    options: IndicatorOptions,
    phase: Phase,
    generation: u64,
    target: Option<Arc<str>>,
    timer: Option<PollTimer>,
    subscription: Option<SubscriptionId>,
    last_dispatched: u64,
    last_applied: u64,
    state_tx: watch::Sender<IndicatorState>,
    target_tx: watch::Sender<String>,
    inbox_tx: mpsc::UnboundedSender<ControllerEvent>,
    inbox_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl<P: WindowProbe, A: Activator, S: SettingsStore> IndicatorController<P, A, S> {
    pub fn new(probe: Arc<P>, activator: Arc<A>, settings: Arc<S>, options: IndicatorOptions) -> Self {
        let (state_tx, _) = watch::channel(IndicatorState::default());
        let (target_tx, _) = watch::channel(String::new());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Self {
            probe,
            activator,
            settings,
            options,
            phase: Phase::Stopped,
            generation: 0,
            target: None,
            timer: None,
            subscription: None,
            last_dispatched: 0,
            last_applied: 0,
            state_tx,
            target_tx,
            inbox_tx,
            inbox_rx,
        }
    }

    pub fn handle(&self) -> IndicatorHandle {
        IndicatorHandle::new(
            self.inbox_tx.clone(),
            self.state_tx.subscribe(),
            self.target_tx.subscribe(),
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> IndicatorState {
        *self.state_tx.borrow()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_some()
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribes to target changes, reads the target, runs a first probe
    /// and arms the poll timer. Does nothing if already running.
    ///
    /// When the listing tool is not installed the indicator settles on
    /// `Read` and no timer is armed.
    pub fn start(&mut self) -> Result<(), SettingsError> {
        if self.phase == Phase::Running {
            log::debug!("Indicator already running");
            return Ok(());
        }

        self.generation += 1;
        let generation = self.generation;
        let key = self.options.settings_key.clone();

        // Subscribe before reading so a change landing in between is not lost.
        let inbox = self.inbox_tx.clone();
        let subscription = self.settings.on_change(
            &key,
            Arc::new(move |name: &str| {
                let _ = inbox.send(ControllerEvent::TargetChanged {
                    generation,
                    name: name.to_string(),
                });
            }),
        );

        let target = match self.settings.get_string(&key) {
            Ok(target) => target,
            Err(e) => {
                self.settings.unsubscribe(subscription);
                log::error!("Cannot start indicator: {}", e);
                return Err(e);
            }
        };

        self.subscription = Some(subscription);
        self.set_target(target);
        self.phase = Phase::Running;
        self.last_applied = self.last_dispatched;
        log::info!("Indicator started for {:?}", self.target().unwrap_or_default());

        if !self.probe.is_available() {
            log::warn!("Window listing tool is not installed; indicator stays in read state");
            self.publish(IndicatorState::Read);
            return Ok(());
        }

        self.poll_now();
        let timer = PollTimer::arm(self.options.poll_interval, self.inbox_tx.clone(), move || {
            ControllerEvent::Tick { generation }
        });
        self.timer = Some(timer);
        log::debug!("Polling every {:?}", self.options.poll_interval);
        Ok(())
    }

    /// Cancels the timer and releases the settings subscription. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(subscription) = self.subscription.take() {
            if !self.settings.unsubscribe(subscription) {
                log::warn!("Settings subscription was already released");
            }
        }

        if self.phase == Phase::Stopped {
            return;
        }
        self.phase = Phase::Stopped;
        self.target = None;
        log::info!("Indicator stopped");
    }

    /// Dispatches a probe for the current target, as a timer tick would.
    pub fn poll_now(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(target) = self.target.clone() else {
            return;
        };

        self.last_dispatched += 1;
        let seq = self.last_dispatched;
        let generation = self.generation;
        let probe = Arc::clone(&self.probe);
        let inbox = self.inbox_tx.clone();
        log::trace!("Dispatching probe #{}", seq);

        tokio::spawn(async move {
            let result = probe.list_windows().await;
            let _ = inbox.send(ControllerEvent::ProbeCompleted {
                generation,
                seq,
                target,
                result,
            });
        });
    }

    /// Asks the window manager to raise the target's window.
    pub fn activate(&mut self) {
        let Some(target) = self.target.clone() else {
            log::warn!("Activation requested while the indicator is stopped");
            return;
        };

        let activator = Arc::clone(&self.activator);
        let inbox = self.inbox_tx.clone();
        log::debug!("Activating {:?}", target);

        tokio::spawn(async move {
            let result = activator.activate(&target).await;
            let _ = inbox.send(ControllerEvent::ActivationCompleted { target, result });
        });
    }

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Tick { generation } => {
                if self.is_current(generation) {
                    self.poll_now();
                }
            }
            ControllerEvent::ProbeCompleted {
                generation,
                seq,
                target,
                result,
            } => self.apply_probe(generation, seq, &target, result),
            ControllerEvent::TargetChanged { generation, name } => {
                if self.is_current(generation) {
                    self.set_target(name);
                }
            }
            ControllerEvent::Activate => self.activate(),
            ControllerEvent::ActivationCompleted { target, result } => match result {
                Ok(()) => log::info!("Raised window matching {:?}", target),
                Err(e) => log::warn!("Could not raise {:?}: {}", target, e),
            },
            ControllerEvent::Shutdown => self.stop(),
        }
    }

    /// Waits for the next inbox event and handles it.
    pub async fn process_next(&mut self) {
        if let Some(event) = self.inbox_rx.recv().await {
            self.handle_event(event);
        }
    }

    /// Handles every event already queued without waiting for more.
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Drives the controller until shutdown, then stops it.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                Some(event) = self.inbox_rx.recv() => {
                    let done = matches!(event, ControllerEvent::Shutdown);
                    self.handle_event(event);
                    if done {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    log::debug!("Shutdown signal received by indicator");
                    break;
                }
            }
        }
        self.stop();
    }

    fn is_current(&self, generation: u64) -> bool {
        self.phase == Phase::Running && generation == self.generation
    }

    fn set_target(&mut self, name: String) {
        if name.is_empty() {
            log::warn!("Target app name is empty; indicator will always show unread");
        }
        if self.target.as_deref() != Some(name.as_str()) {
            log::info!("Target app name set to {:?}", name);
        }
        self.target_tx.send_if_modified(|current| {
            if *current == name {
                return false;
            }
            current.clone_from(&name);
            true
        });
        self.target = Some(Arc::from(name));
    }

    fn apply_probe(&mut self, generation: u64, seq: u64, target: &str, result: Result<String, ProbeError>) {
        if !self.is_current(generation) {
            log::trace!("Dropping probe #{} from a stopped run", seq);
            return;
        }
        if seq <= self.last_applied {
            log::debug!("Dropping stale probe #{} (already applied #{})", seq, self.last_applied);
            return;
        }
        self.last_applied = seq;

        match result {
            Ok(listing) => self.publish(classify(&listing, target)),
            Err(ProbeError::NoOutput) => log::debug!("Probe #{} returned no output", seq),
            Err(e) => log::warn!("Probe #{} failed: {}", seq, e),
        }
    }

    fn publish(&self, state: IndicatorState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            log::info!("Indicator state: {:?}", state);
        }
    }
}

impl<P: WindowProbe, A: Activator, S: SettingsStore> Drop for IndicatorController<P, A, S> {
    fn drop(&mut self) {
        self.stop();
    }
}
