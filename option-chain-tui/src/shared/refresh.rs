/// Cancellable periodic refresh timer
///
/// Emits a tick message every `period` until stopped or dropped. The first
/// tick fires one full period after start.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a running refresh timer task
#[derive(Debug)]
pub struct RefreshTimer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefreshTimer {
    /// Spawn the timer, sending `tick` into `tx` on every period
    pub fn start<T>(period: Duration, tx: mpsc::UnboundedSender<T>, tick: T) -> Self
    where
        T: Clone + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tx.send(tick.clone()).is_err() {
                            debug!("Refresh receiver dropped, stopping timer");
                            break;
                        }
                    }
                    _ = &mut shutdown_rx => {
                        debug!("Refresh timer shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Cancel the timer; no tick is delivered after this returns and the task exits
    pub fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && !self.task.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let timer = RefreshTimer::start(Duration::from_secs(30), tx, "tick");

        assert_eq!(rx.recv().await, Some("tick"));
        assert_eq!(started.elapsed(), Duration::from_secs(30));

        assert_eq!(rx.recv().await, Some("tick"));
        assert_eq!(started.elapsed(), Duration::from_secs(60));

        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = RefreshTimer::start(Duration::from_secs(30), tx, ());

        timer.stop();
        assert!(!timer.is_running());

        // Sender is dropped when the task exits, so the channel closes without a tick
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let _timer = RefreshTimer::start(Duration::from_secs(30), tx, ());
        }
        assert_eq!(rx.recv().await, None);
    }
}
