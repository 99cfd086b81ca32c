//! Prometheus metrics for the pipeline stage latencies the latency budget
//! is measured against, plus basic request/error counters.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

pub fn record_request() {
    metrics::counter!("vox_requests_total").increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("vox_errors_total", "kind" => kind).increment(1);
}

pub fn record_stt_latency(elapsed: Duration) {
    metrics::histogram!("vox_stt_latency_ms").record(elapsed.as_millis() as f64);
}

pub fn record_llm_latency(elapsed: Duration) {
    metrics::histogram!("vox_llm_latency_ms").record(elapsed.as_millis() as f64);
}

pub fn record_tts_latency(elapsed: Duration) {
    metrics::histogram!("vox_tts_latency_ms").record(elapsed.as_millis() as f64);
}

pub fn record_total_latency(elapsed: Duration) {
    metrics::histogram!("vox_turn_latency_ms").record(elapsed.as_millis() as f64);
}
