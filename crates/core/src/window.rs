use crate::sample::Sample;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Time-bounded history of samples, oldest first.
///
/// Arrival order is time order, so retention is a plain append-at-tail /
/// trim-at-head discipline. Eviction is lazy: the age bound only holds as of
/// the last [`evict`](Self::evict) call.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples:   VecDeque<Sample>,
    window_ms: u64,
}

impl SampleWindow {
    pub fn new(window_ms: u64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_ms,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Change the retention length. Takes effect at the next eviction pass.
    pub fn set_window_ms(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
    }

    /// Push a sample at the tail.
    ///
    /// Callers must supply non-decreasing timestamps; an older sample is
    /// still stored but may outlive its window until the ones ahead of it go.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push_back(sample);
    }

    /// Drop samples from the head while `now - t > window_ms`.
    /// Returns how many were removed.
    pub fn evict(&mut self, now: u64) -> usize {
        let mut removed = 0;
        while let Some(head) = self.samples.front() {
            if now.saturating_sub(head.t()) <= self.window_ms {
                break;
            }
            self.samples.pop_front();
            removed += 1;
        }
        removed
    }

    /// Owned copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn front(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn back(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

/// A [`SampleWindow`] shared between the ingest and snapshot tasks.
///
/// Every mutation and every copy happens under one lock, so a reader never
/// sees a half-applied append or eviction.
#[derive(Debug, Clone)]
pub struct SharedWindow {
    inner: Arc<Mutex<SampleWindow>>,
}

impl SharedWindow {
    pub fn new(window_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SampleWindow::new(window_ms))),
        }
    }

    /// Lock the window. A poisoned lock is recovered: the window holds plain
    /// values and every operation leaves it consistent.
    pub fn lock(&self) -> MutexGuard<'_, SampleWindow> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append and trim in one critical section, using the same `now`.
    pub fn append_and_evict(&self, sample: Sample, now: u64) -> usize {
        let mut window = self.lock();
        window.append(sample);
        window.evict(now)
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().snapshot()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::RawVector;

    const WINDOW_MS: u64 = 10_000;

    fn sample(t: u64) -> Sample {
        Sample::new(t, RawVector::new(1.0, 2.0, 3.0)).unwrap()
    }

    fn times(window: &SampleWindow) -> Vec<u64> {
        window.iter().map(Sample::t).collect()
    }

    #[test]
    fn ten_second_window_scenario() {
        let mut window = SampleWindow::new(WINDOW_MS);
        for t in (0..10).map(|i| i * 1_000) {
            window.append(sample(t));
        }

        assert_eq!(window.evict(9_500), 0);
        assert_eq!(window.len(), 10);

        window.append(sample(10_500));
        assert_eq!(window.evict(10_500), 1);
        assert_eq!(window.len(), 10);
        assert_eq!(window.front().map(Sample::t), Some(1_000));
        assert_eq!(window.back().map(Sample::t), Some(10_500));
    }

    #[test]
    fn sample_exactly_at_the_boundary_is_kept() {
        let mut window = SampleWindow::new(WINDOW_MS);
        window.append(sample(0));
        assert_eq!(window.evict(10_000), 0);
        assert_eq!(window.evict(10_001), 1);
        assert!(window.is_empty());
    }

    #[test]
    fn evict_is_idempotent_for_the_same_now() {
        let mut window = SampleWindow::new(1_000);
        for t in [0, 200, 400, 1_500, 1_900] {
            window.append(sample(t));
        }
        assert_eq!(window.evict(2_000), 3);
        assert_eq!(window.evict(2_000), 0);
        assert_eq!(times(&window), vec![1_500, 1_900]);
    }

    #[test]
    fn retained_samples_are_young_and_ordered() {
        let mut window = SampleWindow::new(250);
        let mut t = 0;
        for step in [0, 16, 17, 16, 100, 0, 3, 400, 16, 17, 250, 1] {
            t += step;
            window.append(sample(t));
            window.evict(t);

            let ts = times(&window);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]));
            assert!(ts.iter().all(|&s| t - s <= 250));
        }
    }

    #[test]
    fn evict_stops_at_first_young_sample() {
        let mut window = SampleWindow::new(100);
        // out-of-order tail: the stale sample behind a young head survives
        window.append(sample(500));
        window.append(sample(0));
        assert_eq!(window.evict(550), 0);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn clear_then_snapshot_is_empty() {
        let mut window = SampleWindow::new(WINDOW_MS);
        window.append(sample(1));
        window.append(sample(2));
        window.clear();
        assert!(window.snapshot().is_empty());
        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut window = SampleWindow::new(WINDOW_MS);
        window.append(sample(1));
        let copy = window.snapshot();
        window.append(sample(2));
        window.clear();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[0].t(), 1);
    }

    #[test]
    fn shared_window_appends_and_evicts_together() {
        let shared = SharedWindow::new(1_000);
        let other = shared.clone();
        assert_eq!(shared.append_and_evict(sample(0), 0), 0);
        assert_eq!(shared.append_and_evict(sample(1_500), 1_500), 1);
        assert_eq!(other.len(), 1);
        other.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn shared_window_snapshots_across_threads() {
        let shared = SharedWindow::new(u64::MAX);
        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for t in 0..1_000 {
                    shared.append_and_evict(sample(t), t);
                }
            })
        };
        for _ in 0..100 {
            let snap = shared.snapshot();
            assert!(snap.windows(2).all(|w| w[0].t() <= w[1].t()));
        }
        writer.join().unwrap();
        assert_eq!(shared.len(), 1_000);
    }
}
