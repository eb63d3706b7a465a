//! Prometheus metrics exposition
//!
//! - `provider_operations_total` (counter): labels `resource`, `operation`, `outcome`
//! - `provider_operation_duration_seconds` (histogram): labels `resource`, `operation`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_METRIC: &str = "provider_operation_duration_seconds";

/// Bucket boundaries span quick reads up to the 10 minute default wait.
const DURATION_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_METRIC.to_string()), DURATION_BUCKETS)
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record one finished resource operation. `outcome` is `ok` or `error`.
pub fn record_operation(resource: &str, operation: &str, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "provider_operations_total",
        "resource" => resource.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!(
        DURATION_METRIC,
        "resource" => resource.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}
