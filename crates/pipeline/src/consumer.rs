use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};
use vscope_core::Snapshot;

/// Receiver of published snapshots.
///
/// `publish` runs on the snapshot task and must return quickly; anything slow
/// belongs on the other side of a [`ChannelConsumer`].
pub trait Consumer: Send {
    fn publish(&mut self, snapshot: Snapshot);
}

impl<F> Consumer for F
where
    F: FnMut(Snapshot) + Send,
{
    fn publish(&mut self, snapshot: Snapshot) {
        self(snapshot)
    }
}

/// Forwards snapshots into a bounded channel without ever waiting.
///
/// When the receiver falls behind the new snapshot is dropped; the next
/// publish supersedes it anyway.
#[derive(Debug)]
pub struct ChannelConsumer {
    tx:      mpsc::Sender<Snapshot>,
    dropped: u64,
}

impl ChannelConsumer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Snapshot>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    /// Snapshots discarded because the receiver was full or gone.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Consumer for ChannelConsumer {
    fn publish(&mut self, snapshot: Snapshot) {
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(s)) => {
                self.dropped += 1;
                debug!("consumer busy; snapshot #{} dropped", s.seq);
            }
            Err(TrySendError::Closed(s)) => {
                self.dropped += 1;
                trace!("consumer gone; snapshot #{} dropped", s.seq);
            }
        }
    }
}
