//! HTTP surface: `/metrics` scrapes every collector, `/status` reports cache
//! state and `/healthz` answers liveness checks.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use core_config::server::ServerConfig;
use eyre::Result;
use observability::CostMetrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::collectors::CollectorRegistry;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CollectorRegistry>,
    /// Flips to `true` on shutdown; in-flight refreshes abort
    pub cancel: watch::Receiver<bool>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/status", get(status))
        .route("/healthz", get(health))
        .with_state(state)
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let scrape = state.registry.scrape(&state.cancel).await;
    for (collector, message) in &scrape.errors {
        warn!(collector, error = %message, "Collector reported an error");
    }
    CostMetrics::publish(&scrape.samples);

    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], observability::render())
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.status().await)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Serve until SIGINT/SIGTERM, then signal `shutdown` so refreshes stop.
pub async fn serve(router: Router, config: &ServerConfig, shutdown: watch::Sender<bool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown.send(true);
        })
        .await
        .inspect_err(|e| error!("Server encountered an error: {:?}", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Schedule an unconditional refresh of every collector.
///
/// The returned scheduler must be kept alive for the job to keep firing.
pub async fn schedule_refresh(
    cron: &str,
    registry: Arc<CollectorRegistry>,
    cancel: watch::Receiver<bool>,
) -> Result<JobScheduler> {
    info!(cron, "Scheduling pricing refresh");

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let registry = registry.clone();
        let cancel = cancel.clone();

        Box::pin(async move {
            info!("Running scheduled pricing refresh");
            let failures = registry.refresh_all(&cancel).await;
            if failures.is_empty() {
                info!("Scheduled refresh complete");
            } else {
                for (collector, e) in &failures {
                    error!(collector, error = %e, "Scheduled refresh failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
