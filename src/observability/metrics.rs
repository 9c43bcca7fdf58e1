//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sigwait_confirmations_total` (counter): finished waits by outcome and deciding source
//! - `sigwait_confirmation_seconds` (histogram): time from wait start to resolution
//! - `sigwait_poll_errors_total` (counter): failed status polls
//! - `sigwait_late_votes_total` (counter): votes discarded after resolution
//! - `sigwait_subscriptions_released_total` (counter): push subscriptions released
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and start its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the end of a confirmation wait.
pub fn record_outcome(outcome: &'static str, source: &'static str, elapsed: Duration) {
    counter!("sigwait_confirmations_total", "outcome" => outcome, "source" => source).increment(1);
    histogram!("sigwait_confirmation_seconds", "outcome" => outcome).record(elapsed.as_secs_f64());
}

pub fn record_poll_error() {
    counter!("sigwait_poll_errors_total").increment(1);
}

pub fn record_late_vote(source: &'static str) {
    counter!("sigwait_late_votes_total", "source" => source).increment(1);
}

pub fn record_subscription_released() {
    counter!("sigwait_subscriptions_released_total").increment(1);
}
