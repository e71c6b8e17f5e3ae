//! Prometheus recorder for the `metrics` facade.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install a Prometheus recorder as the global `metrics` recorder.
///
/// Returns `false` if this process already installed one, or if another
/// recorder is in place.
pub fn init_prometheus() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("prometheus recorder already installed");
        return false;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("prometheus handle already set");
                return false;
            }
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install prometheus recorder");
            false
        }
    }
}

/// Every counter in Prometheus text format, or `None` before [`init_prometheus`].
pub fn render_prometheus() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}
