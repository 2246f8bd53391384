//! Prometheus metrics for the bracket server.
//!
//! Metrics are exposed in Prometheus text format by an exporter listening on
//! its own address. Recording without an installed exporter is a no-op.
//!
//! # Metrics
//!
//! - `http_requests_total`, `http_request_duration_ms`
//! - `brackets_generated_total`, `bracket_teams`
//! - `results_submitted_total`, `result_rejections_total`
//! - `tournaments_completed_total`
//!
//! ```rust,no_run
//! use tourney_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::results_submitted_total();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tourney::ErrorKind;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Bracket Metrics
// ============================================================================

/// Record a generated bracket and its entrant count.
pub fn brackets_generated_total(num_teams: usize) {
    metrics::counter!("brackets_generated_total").increment(1);
    metrics::histogram!("bracket_teams").record(num_teams as f64);
}

/// Record an accepted match result.
pub fn results_submitted_total() {
    metrics::counter!("results_submitted_total").increment(1);
}

/// Record a rejected match result by error class.
pub fn result_rejections_total(kind: ErrorKind) {
    let reason = match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Internal => "internal",
    };
    metrics::counter!("result_rejections_total", "reason" => reason).increment(1);
}

/// Record a tournament whose final was played.
pub fn tournaments_completed_total() {
    metrics::counter!("tournaments_completed_total").increment(1);
}
