//! Metrics definitions for the Office Hours coordinator.
//!
//! All metrics follow Prometheus naming conventions:
//! - `oh_` prefix for the coordinator
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `op`: bounded by store verbs (~13 values)
//! - `outcome`: success | error, plus per-operation rejection labels
//! - `next_state`: 3 values (none, in_queue, in_call)
//! - `status`: 2 values (active, nonactive)
//!
//! Participant and owner ids are never used as labels.

use common::types::{Presence, SessionStatus};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Configures histogram
/// buckets for store latency (internal service call, p99 < 10ms target).
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("oh_store".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set store latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record one store operation.
///
/// Metrics: `oh_store_ops_total`, `oh_store_op_duration_seconds`
/// Labels: `op` (store verb), `outcome` (success | error)
pub fn record_store_op(op: &'static str, outcome: &'static str, duration: Duration) {
    counter!("oh_store_ops_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("oh_store_op_duration_seconds", "op" => op, "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Record one presence transition attempt.
///
/// Metric: `oh_presence_transitions_total`
/// Labels: `next_state`, `outcome` (`applied` on success, otherwise the
/// error type label)
pub fn record_transition(next: Presence, outcome: &'static str) {
    counter!(
        "oh_presence_transitions_total",
        "next_state" => next.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one admission attempt.
///
/// Metric: `oh_admissions_total`
/// Labels: `outcome` (`admitted` | `empty`, otherwise the error type label)
pub fn record_admission(outcome: &'static str) {
    counter!("oh_admissions_total", "outcome" => outcome).increment(1);
}

/// Record one forced queue removal attempt.
///
/// Metric: `oh_queue_removals_total`
/// Labels: `outcome` (`removed` on success, otherwise the error type label)
pub fn record_queue_removal(outcome: &'static str) {
    counter!("oh_queue_removals_total", "outcome" => outcome).increment(1);
}

/// Record one session status change attempt.
///
/// Metric: `oh_status_changes_total`
/// Labels: `status`, `outcome` (`applied` on success, otherwise the error
/// type label)
pub fn record_status_change(status: SessionStatus, outcome: &'static str) {
    counter!(
        "oh_status_changes_total",
        "status" => status.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record participants evicted by a deactivation or bootstrap.
///
/// Metric: `oh_evictions_total`
/// Labels: `reason` (deactivate | bootstrap)
pub fn record_evictions(reason: &'static str, count: usize) {
    counter!("oh_evictions_total", "reason" => reason).increment(count as u64);
}
