use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use vscope_core::{Command, RunState, SharedWindow};

/// Control surface over a running pipeline: pause/resume ingest and reset.
///
/// Cheap to clone; every clone drives the same pipeline.
///
/// Run-state changes are broadcast to the ingest task, which drops its timer
/// while paused.
#[derive(Debug, Clone)]
pub struct Controller {
    run_state: RunState,
    window:    SharedWindow,
    reset:     Arc<AtomicBool>,
    gate:      Arc<watch::Sender<bool>>,
}

impl Controller {
    pub fn new(run_state: RunState, window: SharedWindow) -> Self {
        let (gate, _) = watch::channel(run_state.is_running());
        Self {
            run_state,
            window,
            reset: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(gate),
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    /// Flip the run-state; the ingest driver sees it on its next tick.
    pub fn toggle(&self) -> bool {
        let running = self.run_state.toggle();
        self.gate.send_replace(running);
        info!("ingest {}", if running { "resumed" } else { "paused" });
        running
    }

    /// Empty the window and have the scheduler publish at its next chance.
    /// Leaves the run-state alone.
    pub fn reset(&self) {
        self.window.clear();
        self.reset.store(true, Ordering::Release);
        info!("window reset");
    }

    /// Apply a console command. `Status` and `Shutdown` are left to the caller.
    pub fn apply(&self, command: Command) {
        match command {
            Command::Toggle => {
                self.toggle();
            }
            Command::Reset => self.reset(),
            Command::Status | Command::Shutdown => {}
        }
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    pub(crate) fn reset_flag(&self) -> Arc<AtomicBool> {
        self.reset.clone()
    }

    /// Receiver that follows the run-state as set through this controller.
    pub(crate) fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }
}
