//! Request counters.
//!
//! The orchestrator increments counters through an injected [`MetricsSink`].
//! Counter names live in [`names`] and are a contract with dashboards and
//! alerts: they must not change. [`FacadeMetrics`] hands them to the
//! `metrics` facade, which [`init_prometheus`] can back with a Prometheus
//! recorder.

pub mod names;
mod prometheus;
mod sink;

pub use prometheus::{init_prometheus, render_prometheus};
pub use sink::{CounterRegistry, FacadeMetrics, FanOutMetrics, MetricsSink, NoopMetrics};
