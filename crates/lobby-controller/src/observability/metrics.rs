//! Metrics definitions for the Lobby Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `lc_` prefix for Lobby Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `placement`: 2 values (player, queued)
//! - `kind`: 5 values (one per effect kind, plus teardown)
//! - `status`: 2 values (success, error)
//! - `command`: bounded by the command table (~6 values)
//! - `actor_type`: 2 values (controller, effects)

use crate::registry::Placement;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Resource provider calls are remote platform requests
        .set_buckets_for_metric(
            Matcher::Prefix("lc_effect_duration".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set effect duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Registry Metrics (Gauges)
// ============================================================================

/// Set the number of open lobbies.
///
/// Metric: `lc_lobbies_active`
/// Labels: none
pub fn set_lobbies_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("lc_lobbies_active").set(count as f64);
}

/// Set the number of participants across all lobbies (players and queued).
///
/// Metric: `lc_participants_active`
/// Labels: none
pub fn set_participants_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("lc_participants_active").set(count as f64);
}

/// Set the mailbox depth for an actor.
///
/// Metric: `lc_actor_mailbox_depth`
/// Labels: `actor_type` (controller, effects)
pub fn set_actor_mailbox_depth(actor_type: &'static str, depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("lc_actor_mailbox_depth", "actor_type" => actor_type).set(depth as f64);
}

// ============================================================================
// Registry Metrics (Counters)
// ============================================================================

/// Record a successful sign-up.
///
/// Metric: `lc_sign_ups_total`
/// Labels: `placement` (player, queued)
pub fn record_sign_up(placement: Placement) {
    let placement = match placement {
        Placement::Player => "player",
        Placement::Queued { .. } => "queued",
    };
    counter!("lc_sign_ups_total", "placement" => placement).increment(1);
}

/// Record a queue head promoted onto a roster.
///
/// Metric: `lc_promotions_total`
/// Labels: none
pub fn record_promotion() {
    counter!("lc_promotions_total").increment(1);
}

/// Record a registry invariant violation.
///
/// Metric: `lc_invariant_violations_total`
/// Labels: none
///
/// ALERT: Any non-zero value indicates a bug. The controller stops after one.
pub fn record_invariant_violation() {
    counter!("lc_invariant_violations_total").increment(1);
}

// ============================================================================
// Effect Metrics
// ============================================================================

/// Record an executed effect.
///
/// Metrics: `lc_effects_total` (labels: `kind`, `status`),
/// `lc_effect_duration_seconds` (labels: `kind`),
/// `lc_effect_failures_total` (labels: `kind`, on failure only)
pub fn record_effect(kind: &'static str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };

    histogram!("lc_effect_duration_seconds", "kind" => kind).record(duration.as_secs_f64());
    counter!("lc_effects_total", "kind" => kind, "status" => status).increment(1);

    if !success {
        counter!("lc_effect_failures_total", "kind" => kind).increment(1);
    }
}

// ============================================================================
// Command Metrics
// ============================================================================

/// Record a handled chat command.
///
/// Metric: `lc_commands_total`
/// Labels: `command`, `status` (success, error)
pub fn record_command(command: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!("lc_commands_total", "command" => command, "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // No recorder is installed in unit tests; the calls go to the no-op
    // recorder and must not panic.

    #[test]
    fn test_registry_gauges() {
        set_lobbies_active(0);
        set_lobbies_active(5);
        set_participants_active(0);
        set_participants_active(120);
        set_actor_mailbox_depth("controller", 0);
        set_actor_mailbox_depth("effects", 42);
    }

    #[test]
    fn test_registry_counters() {
        record_sign_up(Placement::Player);
        record_sign_up(Placement::Queued { position: 3 });
        record_promotion();
        record_invariant_violation();
    }

    #[test]
    fn test_record_effect() {
        record_effect("create_voice_channel", true, Duration::from_millis(20));
        record_effect("render_status_display", false, Duration::from_millis(250));
    }

    #[test]
    fn test_record_command() {
        record_command("open_lobby", true);
        record_command("sign_up", false);
    }

    #[test]
    fn test_metric_names_recorded() {
        use metrics_util::debugging::DebuggingRecorder;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            set_lobbies_active(2);
            set_participants_active(9);
            record_sign_up(Placement::Queued { position: 1 });
            record_promotion();
            record_effect("delete_voice_channel", false, Duration::from_millis(5));
        });

        let names: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        for expected in [
            "lc_lobbies_active",
            "lc_participants_active",
            "lc_sign_ups_total",
            "lc_promotions_total",
            "lc_effects_total",
            "lc_effect_failures_total",
            "lc_effect_duration_seconds",
        ] {
            assert!(
                names.iter().any(|name| name == expected),
                "missing metric {expected}"
            );
        }
    }
}
