//! Prometheus metrics exposition
//!
//! The engine emits these through the `metrics` facade:
//!
//! - `promo_poll_outcomes_total` (counter): label `outcome`
//! - `promo_auth_failures_total` (counter)
//! - `promo_codes_persisted_total` (counter)
//! - `promo_codes_duplicate_total` (counter)
//! - `promo_unit_restarts_total` (counter)
//!
//! Without an installed recorder every call is a no-op, so the recorder is
//! only installed when the status listener is enabled.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

/// Attach HELP text to every engine metric.
pub fn describe() {
    metrics::describe_counter!(
        "promo_poll_outcomes_total",
        "Registration attempts by classified outcome"
    );
    metrics::describe_counter!(
        "promo_auth_failures_total",
        "Failed login attempts"
    );
    metrics::describe_counter!(
        "promo_codes_persisted_total",
        "New promo codes appended to durable output"
    );
    metrics::describe_counter!(
        "promo_codes_duplicate_total",
        "Redeemed codes suppressed as already written"
    );
    metrics::describe_counter!(
        "promo_unit_restarts_total",
        "Execution units respawned after an abnormal exit"
    );
}
