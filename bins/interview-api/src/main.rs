mod error;
mod handlers;
mod metrics;
mod routes;
mod store;

use anyhow::{Context, Result};
use axum::Router;
use interview_common::config::{AppConfig, SessionLimits};
use interview_core::InterviewController;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::store::SessionStore;

pub struct AppState {
    pub controller: InterviewController,
    pub sessions: SessionStore,
    pub config: AppConfig,
    pub grader_backend: &'static str,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Periodically discard expired sessions
fn spawn_session_sweeper(sessions: SessionStore, limits: SessionLimits) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limits.sweep_interval());

        loop {
            interval.tick().await;

            let evicted = sessions
                .evict_expired(limits.idle_ttl(), limits.finished_ttl())
                .await;

            if evicted > 0 {
                metrics::SESSIONS_EVICTED_TOTAL.inc_by(evicted as u64);
                let remaining = sessions.len().await;
                info!(evicted = evicted, remaining = remaining, "Expired sessions evicted");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Interview API booting...");

    let config = AppConfig::load_default().context("Failed to load configuration")?;
    let controller = InterviewController::from_config(&config)
        .context("Failed to initialize interview controller")?;

    metrics::register_metrics().context("Failed to register metrics")?;

    let grader_backend = config.grader.backend.as_str();
    let sessions = SessionStore::new();
    spawn_session_sweeper(sessions.clone(), config.sessions.clone());

    let state = Arc::new(AppState {
        controller,
        sessions,
        config,
        grader_backend,
    });

    let app = Router::new().merge(routes::routes()).with_state(state);

    let addr = std::env::var("INTERVIEW_API_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, grader_backend = grader_backend, "HTTP server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
