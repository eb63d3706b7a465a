//! QuickSight provider host
//!
//! Single-binary service that:
//! 1. Loads config and AWS credentials
//! 2. Builds the signed control-plane client and the resource registry
//! 3. Serves schema discovery and resource operations over HTTP/JSON
//! 4. Cancels in-flight waits on shutdown

mod config;
mod error;
mod host;
mod metrics;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{FromRef, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_exporter_prometheus::PrometheusHandle;
use quicksight::AwsClient;
use quicksight_api::HttpClient;

use crate::config::Config;
use crate::host::HostState;

/// Time allowed for in-flight operations to unwind after the shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    host: HostState,
    prometheus: PrometheusHandle,
    region: String,
    started_at: Instant,
}

impl FromRef<AppState> for HostState {
    fn from_ref(state: &AppState) -> Self {
        state.host.clone()
    }
}

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer based on `max_connections`.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/schema", get(host::schemas))
        .route("/v1/resources/{type_name}/{operation}", post(host::operation))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting quicksight-provider");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let credentials = config
        .aws
        .credentials
        .clone()
        .context("AWS credentials missing after config load")?;

    let mut client = HttpClient::new(reqwest::Client::new(), &config.aws.region, credentials);
    if let Some(endpoint) = &config.aws.endpoint {
        client = client.with_endpoint(endpoint);
    }

    info!(
        listen_addr = %config.server.listen_addr,
        region = %config.aws.region,
        account_id = %config.aws.account_id,
        endpoint = client.endpoint(),
        max_connections = config.server.max_connections,
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let app_state = AppState {
        host: HostState {
            resources: Arc::new(host::registry(quicksight::resources())),
            meta: AwsClient::new(&config.aws.account_id, &config.aws.region, Arc::new(client)),
            timeouts: config.timeouts,
            shutdown: shutdown.clone(),
        },
        prometheus: prometheus_handle,
        region: config.aws.region.clone(),
        started_at: Instant::now(),
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // Graceful shutdown:
    // 1. shutdown_signal() fires on SIGTERM/SIGINT
    // 2. the root token is cancelled, so every running wait returns
    // 3. axum stops accepting connections and drains, bounded by DRAIN_TIMEOUT
    let drain = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain.cancelled().await })
            .await
    });

    shutdown_signal().await;
    shutdown.cancel();

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Liveness plus what this host serves.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resources: Vec<&str> = state.host.resources.keys().map(String::as_str).collect();
    let body = serde_json::json!({
        "status": if state.host.shutdown.is_cancelled() { "shutting_down" } else { "healthy" },
        "region": state.region,
        "account_id": state.host.meta.account_id(),
        "resources": resources,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    });
    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
