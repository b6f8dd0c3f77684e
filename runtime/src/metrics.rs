//! Prometheus metrics for the inventory engine.
//!
//! Recorders here are the only place metric names appear. The exporter is
//! installed once by the server binary; without it every recorder is a no-op.
//!
//! # Example
//!
//! ```rust,no_run
//! use boxoffice_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! let body = server.render();
//! # Ok(())
//! # }
//! ```

use boxoffice_core::{InventoryError, LifecycleTransition};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
///
/// The HTTP listener itself is owned by the server binary, which renders
/// [`MetricsServer::render`] on `GET /metrics`.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed is tolerated.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let message = e.to_string();
                if message.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping");
                    Ok(())
                } else {
                    Err(MetricsError::Install(message))
                }
            },
        }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for rendering, if this instance installed the recorder.
    #[must_use]
    pub fn handle(&self) -> Option<PrometheusHandle> {
        self.handle.clone()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "boxoffice_reservations_total",
        "Reservation attempts by outcome"
    );
    describe_histogram!(
        "boxoffice_reservation_duration_seconds",
        "Time taken to create a reservation, including lock wait"
    );
    describe_counter!(
        "boxoffice_settlements_total",
        "Payment settlements by outcome"
    );
    describe_counter!(
        "boxoffice_lifecycle_transitions_total",
        "Ticket type status transitions applied by the scheduler"
    );
    describe_counter!(
        "boxoffice_lifecycle_batch_failures_total",
        "Scheduler batches that failed and were deferred to the next run"
    );
}

/// Reservation metrics recorder.
pub struct ReservationMetrics;

impl ReservationMetrics {
    /// Record a reservation attempt.
    pub fn record(result: Result<(), &InventoryError>, duration: Duration) {
        let outcome = match result {
            Ok(()) => "created",
            Err(InventoryError::InsufficientStock { .. }) => "insufficient_stock",
            Err(InventoryError::Timeout(_)) => "timeout",
            Err(InventoryError::Conflict(_)) => "conflict",
            Err(err) if err.is_domain_error() => "rejected",
            Err(_) => "error",
        };
        counter!("boxoffice_reservations_total", "outcome" => outcome).increment(1);
        histogram!("boxoffice_reservation_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Settlement metrics recorder.
pub struct SettlementMetrics;

impl SettlementMetrics {
    /// Record a settlement with outcome `confirmed`, `payment_failed`,
    /// `cancelled`, `conflict` or `gateway_error`.
    pub fn record(outcome: &'static str) {
        counter!("boxoffice_settlements_total", "outcome" => outcome).increment(1);
    }
}

/// Lifecycle scheduler metrics recorder.
pub struct LifecycleMetrics;

impl LifecycleMetrics {
    /// Record rows moved by one batch.
    pub fn record_transitions(transition: LifecycleTransition, count: u64) {
        counter!("boxoffice_lifecycle_transitions_total", "transition" => transition.as_str())
            .increment(count);
    }

    /// Record a failed batch.
    pub fn record_batch_failure(transition: LifecycleTransition) {
        counter!("boxoffice_lifecycle_batch_failures_total", "transition" => transition.as_str())
            .increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn server_starts_without_handle() {
        let server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn recorded_metrics_are_rendered() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        ReservationMetrics::record(Ok(()), Duration::from_millis(12));
        ReservationMetrics::record(
            Err(&InventoryError::InsufficientStock {
                requested: 4,
                remaining: 2,
            }),
            Duration::from_millis(3),
        );
        LifecycleMetrics::record_transitions(LifecycleTransition::Open, 2);

        // Another test may have installed the recorder first.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("boxoffice_reservations_total"));
            assert!(rendered.contains("insufficient_stock"));
            assert!(rendered.contains("boxoffice_lifecycle_transitions_total"));
        }
    }
}
