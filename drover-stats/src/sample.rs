//! Running-average sample collector

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of samples held before they are merged
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Default time after which buffered samples are merged even if the buffer is not full
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(5);

/// Lifetime mean of a stream of `u64` samples
///
/// Samples land in a small hot buffer and are periodically merged into the
/// running average, so adding a sample is a push under a short lock. Any
/// number of threads may add samples concurrently; [`SampleCollector::average`]
/// always merges pending samples before answering.
#[derive(Debug, Clone)]
pub struct SampleCollector {
    inner: Arc<Mutex<Samples>>,
}

#[derive(Debug)]
struct Samples {
    hot: Vec<u64>,
    capacity: usize,
    average: f64,
    total: u64,
    purge_deadline: Instant,
    purge_interval: Duration,
}

impl Samples {
    /// Fold the hot buffer into the running average
    ///
    /// `avg / (1 + n/total) + sum / (total + n)` equals the weighted mean
    /// `(avg * total + sum) / (total + n)` without ever forming `avg * total`,
    /// which keeps the value bounded on long runs. With `total == 0` the first
    /// term is `0 / inf == 0`.
    fn merge(&mut self) {
        self.purge_deadline = Instant::now() + self.purge_interval;

        let n = self.hot.len();
        if n == 0 {
            return;
        }

        let sum = self.hot.iter().map(|&v| v as u128).sum::<u128>() as f64;
        let n_f = n as f64;
        let total_f = self.total as f64;

        self.average = self.average / (1.0 + n_f / total_f) + sum / (total_f + n_f);
        self.total += n as u64;
        self.hot.clear();
    }
}

impl SampleCollector {
    /// Create a collector with the default buffer capacity and purge interval
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_BUFFER_CAPACITY, DEFAULT_PURGE_INTERVAL)
    }

    /// Create a collector with a custom buffer capacity and purge interval
    ///
    /// A capacity of zero is treated as one.
    pub fn with_settings(capacity: usize, purge_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Samples {
                hot: Vec::with_capacity(capacity),
                capacity,
                average: 0.0,
                total: 0,
                purge_deadline: Instant::now() + purge_interval,
                purge_interval,
            })),
        }
    }

    /// Add one sample
    pub fn add_sample(&self, value: u64) {
        let purge_due = {
            let mut samples = self.inner.lock();
            if samples.hot.len() >= samples.capacity {
                samples.merge();
            }
            samples.hot.push(value);

            let now = Instant::now();
            if now > samples.purge_deadline {
                samples.purge_deadline = now + samples.purge_interval;
                true
            } else {
                false
            }
        };

        if purge_due {
            self.schedule_merge();
        }
    }

    /// Mean of every sample added so far and the number of samples
    pub fn average(&self) -> (f64, u64) {
        let mut samples = self.inner.lock();
        samples.merge();
        (samples.average, samples.total)
    }

    /// Merge buffered samples off the caller's path
    ///
    /// Runs on the ambient tokio runtime when there is one and inline
    /// otherwise. A concurrent merge triggered by a full buffer may run first;
    /// the cadence is approximate and `average` merges regardless.
    fn schedule_merge(&self) {
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    inner.lock().merge();
                });
            }
            Err(_) => inner.lock().merge(),
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.inner.lock().hot.len()
    }
}

impl Default for SampleCollector {
    fn default() -> Self {
        Self::new()
    }
}
