use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Repeating tick source. Cancelling consumes the handle, and dropping it
/// aborts the task, so a timer can only ever be torn down once.
pub struct PollTimer {
    task: JoinHandle<()>,
}

impl PollTimer {
    /// Posts `make_tick()` into `inbox` every `period`, first after one full period.
    pub fn arm<T, F>(period: Duration, inbox: mpsc::UnboundedSender<T>, make_tick: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if inbox.send(make_tick()).is_err() {
                    break;
                }
            }
        });
        Self { task }
    }

    pub fn cancel(self) {
        drop(self);
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        // Arrange
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = PollTimer::arm(Duration::from_secs(3), tx, || "tick");

        // Act
        time::sleep(Duration::from_millis(2900)).await;
        let before_first = rx.try_recv().is_ok();
        time::sleep(Duration::from_millis(200)).await;
        let first = rx.try_recv().ok();
        time::sleep(Duration::from_secs(3)).await;
        let second = rx.try_recv().ok();

        // Assert
        assert!(!before_first);
        assert_eq!(first, Some("tick"));
        assert_eq!(second, Some("tick"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        // Arrange
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = PollTimer::arm(Duration::from_secs(1), tx, || ());

        // Act
        timer.cancel();
        time::sleep(Duration::from_secs(5)).await;

        // Assert
        assert!(rx.try_recv().is_err());
        assert!(rx.recv().await.is_none(), "sender should be dropped with the aborted task");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_exits_when_inbox_closes() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let timer = PollTimer::arm(Duration::from_secs(1), tx, || ());

        drop(rx);
        time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert!(timer.is_finished());
    }
}
