//! High-rate ingest path: source → decode → derive → window.

use crate::control::Controller;
use crate::task::{check_period, run_gated, TaskHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use vscope_core::{Clock, Result, RunState, Sample, SharedWindow};
use vscope_source::{decode_payload, PayloadError, Source};

/// Why a tick's payload was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not decodable into three numeric fields.
    Malformed,
    /// A component was NaN or infinite.
    NonFinite,
}

impl From<&PayloadError> for DropReason {
    fn from(err: &PayloadError) -> Self {
        match err {
            PayloadError::NonFinite { .. } => Self::NonFinite,
            PayloadError::Malformed(_) | PayloadError::NotANumber { .. } => Self::Malformed,
        }
    }
}

/// What a single ingest tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run-state is off; nothing was read or touched.
    Paused,
    /// The source had nothing this tick.
    Empty,
    /// A sample was appended and `evicted` stale ones were trimmed.
    Appended { evicted: usize },
    /// The payload was rejected; the window is unchanged.
    Dropped(DropReason),
}

/// Running totals kept by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub ticks:      u64,
    pub paused:     u64,
    pub empty:      u64,
    pub appended:   u64,
    pub malformed:  u64,
    pub non_finite: u64,
    pub evicted:    u64,
}

impl IngestStats {
    pub fn dropped(&self) -> u64 {
        self.malformed + self.non_finite
    }
}

/// Reads one payload per tick and feeds the shared window.
pub struct IngestDriver<S> {
    source:    S,
    window:    SharedWindow,
    run_state: RunState,
    clock:     Arc<dyn Clock>,
    last_t:    Option<u64>,
    stats:     IngestStats,
}

impl<S: Source> IngestDriver<S> {
    pub fn new(source: S, window: SharedWindow, run_state: RunState, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            window,
            run_state,
            clock,
            last_t: None,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one ingest step.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        if !self.run_state.is_running() {
            self.stats.paused += 1;
            return TickOutcome::Paused;
        }

        let Some(payload) = self.source.read() else {
            self.stats.empty += 1;
            return TickOutcome::Empty;
        };

        let raw = match decode_payload(&payload) {
            Ok(raw) => raw,
            Err(e) => return self.drop_sample(DropReason::from(&e), &e),
        };

        // a clock that stepped backwards must not break window ordering
        let now = self.clock.now_ms().max(self.last_t.unwrap_or(0));

        let Some(sample) = Sample::new(now, raw) else {
            return self.drop_sample(DropReason::NonFinite, &"non-finite component");
        };

        let evicted = self.window.append_and_evict(sample, now);
        self.last_t = Some(now);
        self.stats.appended += 1;
        self.stats.evicted += evicted as u64;
        TickOutcome::Appended { evicted }
    }

    fn drop_sample(&mut self, reason: DropReason, cause: &dyn std::fmt::Display) -> TickOutcome {
        match reason {
            DropReason::Malformed => self.stats.malformed += 1,
            DropReason::NonFinite => self.stats.non_finite += 1,
        }
        debug!("dropping sample: {cause}");
        TickOutcome::Dropped(reason)
    }
}

impl<S: Source + 'static> IngestDriver<S> {
    /// Tick every `period` on a background task until stopped.
    ///
    /// While `controller` has ingest paused the task holds no timer at all;
    /// the per-tick run-state check only covers a pause racing a tick.
    pub fn spawn(mut self, period: Duration, controller: &Controller) -> Result<TaskHandle<Self>> {
        check_period("ingest", period)?;
        info!("ingest running every {period:?}");

        let running = controller.subscribe_running();
        Ok(TaskHandle::spawn("ingest", move |shutdown| async move {
            run_gated(period, shutdown, running, || {
                self.tick();
            })
            .await;
            self
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscope_core::ManualClock;

    fn payload(x: f64, y: f64, z: f64) -> String {
        format!(r#"{{"x":{x},"y":{y},"z":{z}}}"#)
    }

    fn driver<S: Source>(source: S, clock: &ManualClock) -> (IngestDriver<S>, SharedWindow, RunState) {
        let window = SharedWindow::new(10_000);
        let run_state = RunState::new();
        let driver = IngestDriver::new(source, window.clone(), run_state.clone(), Arc::new(clock.clone()));
        (driver, window, run_state)
    }

    #[test]
    fn running_tick_appends_one_stamped_sample() {
        let clock = ManualClock::new(1_234);
        let (mut driver, window, _) = driver(|| Some(payload(3.0, 4.0, 0.0)), &clock);

        assert_eq!(driver.tick(), TickOutcome::Appended { evicted: 0 });
        let snap = window.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].t(), 1_234);
        assert_eq!(snap[0].mag(), 5.0);
    }

    #[test]
    fn malformed_payload_leaves_window_unchanged() {
        let clock = ManualClock::new(0);
        let mut feed = vec![
            payload(1.0, 1.0, 1.0),
            r#"{"x":1,"y":2}"#.to_string(),
            payload(2.0, 2.0, 2.0),
        ]
        .into_iter();
        let (mut driver, window, _) = driver(move || feed.next(), &clock);

        driver.tick();
        let before = window.len();
        assert_eq!(driver.tick(), TickOutcome::Dropped(DropReason::Malformed));
        assert_eq!(window.len(), before);
        assert!(matches!(driver.tick(), TickOutcome::Appended { .. }));
        assert_eq!(driver.stats().malformed, 1);
        assert_eq!(driver.stats().appended, 2);
    }

    #[test]
    fn non_finite_payload_is_dropped() {
        let clock = ManualClock::new(0);
        let (mut driver, window, _) = driver(|| Some(r#"{"x":"inf","y":0,"z":0}"#.to_string()), &clock);
        assert_eq!(driver.tick(), TickOutcome::Dropped(DropReason::NonFinite));
        assert!(window.is_empty());
        assert_eq!(driver.stats().dropped(), 1);
    }

    #[test]
    fn paused_driver_reads_nothing() {
        let clock = ManualClock::new(0);
        let mut reads = 0u32;
        let (mut driver, window, run_state) = driver(
            move || {
                reads += 1;
                Some(payload(reads as f64, 0.0, 0.0))
            },
            &clock,
        );

        driver.tick();
        assert!(!run_state.toggle());
        for _ in 0..100 {
            clock.advance(17);
            assert_eq!(driver.tick(), TickOutcome::Paused);
        }
        assert_eq!(window.len(), 1);

        run_state.toggle();
        assert!(matches!(driver.tick(), TickOutcome::Appended { .. }));
        assert_eq!(window.len(), 2);
        // the source was not consulted while paused
        assert_eq!(window.snapshot()[1].x(), 2.0);
    }

    #[test]
    fn paused_driver_does_not_evict() {
        let clock = ManualClock::new(0);
        let (mut driver, window, run_state) = driver(|| Some(payload(1.0, 0.0, 0.0)), &clock);
        driver.tick();
        run_state.set_running(false);
        clock.advance(60_000);
        driver.tick();
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn ticks_evict_with_the_append_time() {
        let clock = ManualClock::new(0);
        let (mut driver, window, _) = driver(|| Some(payload(0.0, 1.0, 0.0)), &clock);
        for _ in 0..11 {
            driver.tick();
            clock.advance(1_000);
        }
        // t = 0..=10_000; t = 0 sits exactly on the boundary
        assert_eq!(window.len(), 11);
        clock.set(10_500);
        assert_eq!(driver.tick(), TickOutcome::Appended { evicted: 1 });
        assert_eq!(window.len(), 11);
        assert_eq!(driver.stats().evicted, 1);
    }

    #[test]
    fn backwards_clock_keeps_order() {
        let clock = ManualClock::new(5_000);
        let (mut driver, window, _) = driver(|| Some(payload(1.0, 0.0, 0.0)), &clock);
        driver.tick();
        clock.set(4_000);
        driver.tick();
        let ts: Vec<u64> = window.snapshot().iter().map(Sample::t).collect();
        assert_eq!(ts, vec![5_000, 5_000]);
    }

    #[test]
    fn empty_source_counts_but_does_nothing() {
        let clock = ManualClock::new(0);
        let (mut driver, window, _) = driver(|| None::<String>, &clock);
        assert_eq!(driver.tick(), TickOutcome::Empty);
        assert!(window.is_empty());
        assert_eq!(driver.stats().empty, 1);
    }
}
