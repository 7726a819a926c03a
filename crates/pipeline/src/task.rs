use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::sync::watch::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::error;
use vscope_core::{Result, VscopeError};

/// Owner of one periodic background task.
///
/// [`stop`](Self::stop) signals the task and waits for it to exit, handing
/// back whatever state the task owned. Once `stop` returns no further tick
/// runs. Dropping the handle without stopping aborts the task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name:     &'static str,
    shutdown: watch::Sender<bool>,
    join:     Option<JoinHandle<T>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `task`, giving it the shutdown receiver to watch.
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(task(rx));
        Self {
            name,
            shutdown,
            join: Some(join),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the task and recover its state. `None` if the task panicked.
    pub async fn stop(mut self) -> Option<T> {
        let _ = self.shutdown.send(true);
        let join = self.join.take()?;
        match join.await {
            Ok(state) => Some(state),
            Err(e) => {
                error!("{} task ended abnormally: {e}", self.name);
                None
            }
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Reject periods a timer cannot be armed with.
pub(crate) fn check_period(name: &str, period: Duration) -> Result<()> {
    if period.is_zero() {
        return Err(VscopeError::Scheduling(format!("{name} period must be non-zero")));
    }
    Ok(())
}

/// Run `tick` every `period` until `shutdown` flips or its sender goes away.
///
/// Late ticks are skipped rather than bunched up.
pub(crate) async fn run_periodic(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: impl FnMut(),
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if stop_requested(changed, &shutdown) {
                    break;
                }
            }
            _ = ticker.tick() => tick(),
        }
    }
}

/// Like [`run_periodic`], but only while `running` holds `true`.
///
/// Turning `running` off drops the timer entirely; the task then sleeps until
/// it is turned back on, when a fresh timer starts with an immediate tick.
pub(crate) async fn run_gated(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut running: watch::Receiver<bool>,
    mut tick: impl FnMut(),
) {
    loop {
        while !*running.borrow_and_update() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if stop_requested(changed, &shutdown) {
                        return;
                    }
                }
                changed = running.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if stop_requested(changed, &shutdown) {
                        return;
                    }
                }
                changed = running.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*running.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => tick(),
            }
        }
    }
}

fn stop_requested(changed: Result<(), RecvError>, shutdown: &watch::Receiver<bool>) -> bool {
    changed.is_err() || *shutdown.borrow()
}
