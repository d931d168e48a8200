use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: compounds run to a verdict. Labels: status (committed | aborted).
pub const COMPOUNDS_TOTAL: &str = "reserva_compounds_total";

/// Counter: compounds refused at intake (caller contract violations).
pub const INTAKE_REJECTED_TOTAL: &str = "reserva_intake_rejected_total";

/// Histogram: time from dequeue to verdict, in seconds.
pub const TRANSACTION_DURATION_SECONDS: &str = "reserva_transaction_duration_seconds";

/// Histogram: sub-bookings per compound.
pub const COMPOUND_SIZE: &str = "reserva_compound_size";

// ── Domain metrics ──────────────────────────────────────────────

/// Counter: committed VIP preemptions.
pub const PREEMPTIONS_TOTAL: &str = "reserva_preemptions_total";

/// Counter: bookings removed by a committed preemption (victims + siblings).
pub const CANCELLATIONS_TOTAL: &str = "reserva_cancellations_total";

/// Counter: sub-bookings rejected by the evaluator. Labels: reason.
pub const REJECTIONS_TOTAL: &str = "reserva_rejections_total";

/// Counter: notifications delivered. Labels: outcome.
pub const NOTIFICATIONS_TOTAL: &str = "reserva_notifications_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
