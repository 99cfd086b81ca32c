//! Edge binary entry point: loads configuration, installs the metrics
//! recorder, and runs the transport client's reconnect loop until the
//! process is signalled to stop.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use vox_config::{load_edge_settings, EdgeSettings};
use vox_edge::{metrics, run_with_reconnect};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("VOX_ENV").ok();
    let config = match load_edge_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("failed to load config: {e}. using defaults.");
            EdgeSettings::default()
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting vox-edge");
    tracing::info!(environment = ?config.environment, endpoint = %config.transport.endpoint, "configuration loaded");

    let _metrics_handle = metrics::init_metrics();
    tracing::info!("initialized prometheus metrics");

    tokio::select! {
        result = run_with_reconnect(config) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "edge client exhausted reconnect attempts");
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("edge shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

fn init_tracing(config: &EdgeSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vox={},tokio_tungstenite=info", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber.with(fmt_layer).init();
}
