use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/start", post(handlers::start))
        .route("/sessions/:id/message", post(handlers::message))
        .route("/sessions/:id/voice", post(handlers::voice))
        .route("/sessions/:id/language", post(handlers::choose_language))
        .route("/sessions/:id/code", post(handlers::submit_code))
        .route("/sessions/:id/end", post(handlers::end))
        .route("/sessions/:id/reset", post(handlers::reset))
}
