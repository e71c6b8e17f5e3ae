use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics::counter;

/// A destination for counter increments.
///
/// Increments are fire-and-forget: a sink that cannot record must not fail
/// the request that produced the increment.
pub trait MetricsSink: Send + Sync {
    fn inc_counter_by(&self, name: &'static str, delta: u64);

    fn inc_counter(&self, name: &'static str) {
        self.inc_counter_by(name, 1);
    }
}

/// A sink that discards every increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc_counter_by(&self, _name: &'static str, _delta: u64) {}
}

/// A sink that forwards every increment to the `metrics` facade.
///
/// Increments go to whichever recorder is installed, see
/// [`super::init_prometheus`]. Without one they are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeMetrics;

impl MetricsSink for FacadeMetrics {
    fn inc_counter_by(&self, name: &'static str, delta: u64) {
        counter!(name).increment(delta);
    }
}

/// A sink that hands every increment to each of its sinks.
#[derive(Default)]
pub struct FanOutMetrics {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanOutMetrics {
    pub fn new(sinks: Vec<Arc<dyn MetricsSink>>) -> Self {
        Self { sinks }
    }
}

impl MetricsSink for FanOutMetrics {
    fn inc_counter_by(&self, name: &'static str, delta: u64) {
        for sink in &self.sinks {
            sink.inc_counter_by(name, delta);
        }
    }
}

/// An in-process counter registry that can be read back.
///
/// Used where counts must be inspected directly, such as tests and the
/// `replay --counters` summary.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: Mutex<HashMap<&'static str, u64>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter; counters never incremented read as 0.
    pub fn get(&self, name: &str) -> u64 {
        self.lock().get(name).copied().unwrap_or(0)
    }

    /// Every counter incremented so far, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.lock().iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, u64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for CounterRegistry {
    fn inc_counter_by(&self, name: &'static str, delta: u64) {
        let mut counters = self.lock();
        let value = counters.entry(name).or_insert(0);
        *value = value.saturating_add(delta);
    }
}
