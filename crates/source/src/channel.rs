use crate::Source;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

/// Push-based source: an external producer sends payloads through a channel
/// and each ingest tick takes the newest one.
///
/// Payloads pushed faster than the ingest rate are superseded, keeping the
/// stream fresh rather than complete.
#[derive(Debug)]
pub struct ChannelSource {
    rx:         mpsc::Receiver<String>,
    superseded: u64,
}

impl ChannelSource {
    /// Create a source and the sender a producer pushes into.
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { rx, superseded: 0 }, tx)
    }

    /// Payloads dropped because a newer one arrived in the same tick.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}

impl Source for ChannelSource {
    fn read(&mut self) -> Option<String> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(payload) => {
                    if latest.replace(payload).is_some() {
                        self.superseded += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() {
                        trace!("channel source disconnected");
                    }
                    break;
                }
            }
        }
        latest
    }
}
