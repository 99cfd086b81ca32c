//! Prometheus metrics for the edge binary: barge-in frequency, jitter
//! buffer depth, and reconnect activity. Mirrors the server's
//! `init_metrics` pattern (same recorder crate, no exported HTTP surface —
//! the edge has no admin listener, so scraping these is out of scope here).

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

pub fn record_barge_in() {
    metrics::counter!("vox_edge_barge_ins_total").increment(1);
}

pub fn record_reconnect_attempt() {
    metrics::counter!("vox_edge_reconnect_attempts_total").increment(1);
}

pub fn record_jitter_depth(depth: usize) {
    metrics::gauge!("vox_edge_jitter_depth").set(depth as f64);
}
