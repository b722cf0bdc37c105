//! Observability module for the Lobby Controller.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields.
//! Participant names appear in logs (they are the public display names the
//! commands were issued under) but never in metric labels.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `lc_lobbies_active` | Gauge | none | Open lobbies |
//! | `lc_participants_active` | Gauge | none | Players plus queued participants |
//! | `lc_actor_mailbox_depth` | Gauge | `actor_type` | Backpressure indicator |
//! | `lc_sign_ups_total` | Counter | `placement` | Sign-ups by outcome |
//! | `lc_promotions_total` | Counter | none | Queue heads promoted to a roster |
//! | `lc_invariant_violations_total` | Counter | none | Registry faults |
//! | `lc_effects_total` | Counter | `kind`, `status` | Executed effects |
//! | `lc_effect_failures_total` | Counter | `kind` | Failed effects |
//! | `lc_effect_duration_seconds` | Histogram | `kind` | Resource provider latency |
//! | `lc_commands_total` | Counter | `command`, `status` | Chat commands handled |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::init_metrics_recorder;
