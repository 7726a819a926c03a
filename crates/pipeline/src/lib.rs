//! Decoupled-rate sample pipeline.
//!
//! Two periodic tasks share one [`SharedWindow`]:
//! - ingest: reads the source at the ingest rate, appends and evicts
//! - snapshot: polled at the frame rate, publishes copies at the display rate
//!
//! The [`Controller`] pauses ingest (parking its timer) and resets the
//! window; the snapshot task keeps publishing either way.

pub mod clock;
pub mod consumer;
pub mod control;
pub mod ingest;
pub mod scheduler;
pub mod task;

pub use clock::RuntimeClock;
pub use consumer::{ChannelConsumer, Consumer};
pub use control::Controller;
pub use ingest::{DropReason, IngestDriver, IngestStats, TickOutcome};
pub use scheduler::{SnapshotScheduler, Throttle};
pub use task::TaskHandle;

use std::sync::Arc;
use tracing::{info, warn};
use vscope_config::StreamConfig;
use vscope_core::{Clock, Result, RunState, SharedWindow, VscopeError};
use vscope_source::Source;

/// Final counters returned by [`Pipeline::shutdown`].
///
/// A field is `None` when its task had already died.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    pub ingest:    Option<IngestStats>,
    pub published: Option<u64>,
}

/// A running ingest task and snapshot task over one window.
pub struct Pipeline<S, C> {
    stream:     StreamConfig,
    window:     SharedWindow,
    controller: Controller,
    ingest:     Option<TaskHandle<IngestDriver<S>>>,
    snapshot:   Option<TaskHandle<SnapshotScheduler<C>>>,
}

impl<S, C> Pipeline<S, C>
where
    S: Source + 'static,
    C: Consumer + 'static,
{
    /// Validate `stream` and spawn both tasks. Must be called inside a tokio runtime.
    pub fn start(stream: StreamConfig, source: S, consumer: C, clock: Arc<dyn Clock>) -> Result<Self> {
        stream.validate()?;

        let window = SharedWindow::new(stream.window_ms);
        let run_state = RunState::new();
        let controller = Controller::new(run_state.clone(), window.clone());

        let driver = IngestDriver::new(source, window.clone(), run_state, clock);
        let scheduler = SnapshotScheduler::new(
            window.clone(),
            consumer,
            stream.display_period(),
            controller.reset_flag(),
        );

        let ingest = driver.spawn(stream.ingest_period(), &controller)?;
        let snapshot = scheduler.spawn(stream.frame_period())?;

        info!(
            "pipeline started: ingest {} Hz, display {} Hz, window {} ms",
            stream.ingest_hz, stream.display_hz, stream.window_ms
        );

        Ok(Self {
            stream,
            window,
            controller,
            ingest: Some(ingest),
            snapshot: Some(snapshot),
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn window(&self) -> &SharedWindow {
        &self.window
    }

    pub fn stream(&self) -> &StreamConfig {
        &self.stream
    }

    /// Restart both tasks with new timing. The window contents and the
    /// run-state carry over; a task that had died stays down.
    pub async fn reconfigure(&mut self, stream: StreamConfig) -> Result<()> {
        stream.validate()?;
        if stream == self.stream {
            return Ok(());
        }

        let (driver, scheduler) = self.halt().await;
        self.window.lock().set_window_ms(stream.window_ms);

        if let Some(driver) = driver {
            self.ingest = Some(driver.spawn(stream.ingest_period(), &self.controller)?);
        }
        if let Some(mut scheduler) = scheduler {
            scheduler.set_display_period(stream.display_period());
            self.snapshot = Some(scheduler.spawn(stream.frame_period())?);
        }

        info!(
            "pipeline reconfigured: ingest {} Hz, display {} Hz, window {} ms",
            stream.ingest_hz, stream.display_hz, stream.window_ms
        );
        self.stream = stream;

        if self.ingest.is_none() || self.snapshot.is_none() {
            return Err(VscopeError::Scheduling("a pipeline task is no longer running".into()));
        }
        Ok(())
    }

    /// Stop both tasks. No tick of either runs after this returns.
    pub async fn shutdown(mut self) -> PipelineReport {
        let (driver, scheduler) = self.halt().await;
        let report = PipelineReport {
            ingest:    driver.map(|d| d.stats()),
            published: scheduler.map(|s| s.published()),
        };
        info!("pipeline stopped: {report:?}");
        report
    }

    async fn halt(&mut self) -> (Option<IngestDriver<S>>, Option<SnapshotScheduler<C>>) {
        let driver = match self.ingest.take() {
            Some(task) => task.stop().await,
            None => None,
        };
        let scheduler = match self.snapshot.take() {
            Some(task) => task.stop().await,
            None => None,
        };
        if driver.is_none() {
            warn!("ingest task was not running");
        }
        if scheduler.is_none() {
            warn!("snapshot task was not running");
        }
        (driver, scheduler)
    }
}
