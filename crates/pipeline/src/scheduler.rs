//! Low-rate snapshot path: copy the window and hand it to the consumer.

use crate::consumer::Consumer;
use crate::task::{check_period, run_periodic, TaskHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use vscope_core::{Result, SharedWindow, Snapshot};

/// Elapsed-time gate for publishing.
///
/// The first poll always passes. After that a poll passes once `period` has
/// elapsed since the recorded slot. A slightly late pass advances the slot by
/// one period so lateness does not accumulate, but never to more than half a
/// period before the pass, so consecutive publishes stay at least half a
/// period apart. After a stall of two periods or more the slot jumps to the
/// current time instead of bursting.
#[derive(Debug, Clone)]
pub struct Throttle {
    period: Duration,
    last:   Option<Instant>,
}

impl Throttle {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Let the next poll pass regardless of elapsed time.
    pub fn force(&mut self) {
        self.last = None;
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return true;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.period {
            return false;
        }

        let slot = match self.period.checked_mul(2) {
            Some(stall) if elapsed < stall => {
                let carried = last.checked_add(self.period).unwrap_or(now);
                let floor = now.checked_sub(self.period / 2).unwrap_or(now);
                carried.max(floor)
            }
            _ => now,
        };
        self.last = Some(slot);
        true
    }
}

/// Publishes window copies at most once per display period.
pub struct SnapshotScheduler<C> {
    window:    SharedWindow,
    consumer:  C,
    throttle:  Throttle,
    reset:     Arc<AtomicBool>,
    published: u64,
}

impl<C: Consumer> SnapshotScheduler<C> {
    /// `reset` is the flag a [`Controller`](crate::Controller) raises to force
    /// a prompt publish after clearing the window.
    pub fn new(window: SharedWindow, consumer: C, display_period: Duration, reset: Arc<AtomicBool>) -> Self {
        Self {
            window,
            consumer,
            throttle: Throttle::new(display_period),
            reset,
            published: 0,
        }
    }

    /// Number of snapshots handed to the consumer so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn set_display_period(&mut self, period: Duration) {
        self.throttle.set_period(period);
    }

    /// One scheduling opportunity. Returns `true` if a snapshot was published.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.reset.swap(false, Ordering::AcqRel) {
            self.throttle.force();
        }
        if !self.throttle.ready(now) {
            return false;
        }
        self.publish_now();
        true
    }

    /// Copy the window and publish unconditionally.
    pub fn publish_now(&mut self) {
        let samples = self.window.snapshot();
        self.published += 1;
        let snapshot = Snapshot::new(self.published, samples);
        debug!("publishing snapshot #{} ({} samples)", snapshot.seq, snapshot.len());
        self.consumer.publish(snapshot);
    }
}

impl<C: Consumer + 'static> SnapshotScheduler<C> {
    /// Poll every `frame_period` on a background task until stopped.
    pub fn spawn(mut self, frame_period: Duration) -> Result<TaskHandle<Self>> {
        check_period("frame", frame_period)?;
        check_period("display", self.throttle.period())?;
        info!(
            "snapshots every {:?} (polled every {frame_period:?})",
            self.throttle.period()
        );

        Ok(TaskHandle::spawn("snapshot", move |shutdown| async move {
            run_periodic(frame_period, shutdown, || {
                self.poll(Instant::now());
            })
            .await;
            self
        }))
    }
}
