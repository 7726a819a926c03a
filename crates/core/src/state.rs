use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide ingest gate. Clones share the same flag.
///
/// Starts in the running state.
#[derive(Debug, Clone)]
pub struct RunState {
    running: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
