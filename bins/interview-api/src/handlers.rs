// HTTP route handlers for the interview API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use interview_common::types::Language;
use interview_core::{Action, InterviewSession, TurnOutcome};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub role: String,
    pub level: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    /// Base64-encoded audio recording
    pub audio: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub source_code: String,
}

/// POST /sessions - Create an interview session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.role.trim().is_empty() || payload.level.trim().is_empty() {
        return Err(ApiError::BadRequest("role and level are required".to_string()));
    }

    let config = state
        .config
        .session(payload.role.trim(), payload.level.trim())
        .with_company(payload.company)
        .with_job_description(payload.job_description);

    let session = InterviewSession::new(config);
    let view = session.clone();
    state.sessions.insert(session).await;
    metrics::SESSIONS_CREATED_TOTAL.inc();

    info!(
        session_id = %view.id(),
        role = %view.config().role,
        technical = view.config().is_technical(),
        "Session created"
    );

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/{id} - Current session state
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSession>, ApiError> {
    let session = state.sessions.get(&id).await.ok_or(ApiError::SessionNotFound(id))?;
    let view = session.lock().await.clone();
    Ok(Json(view))
}

/// DELETE /sessions/{id} - Discard a session and everything it holds
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(&id).await {
        return Err(ApiError::SessionNotFound(id));
    }

    info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnOutcome>, ApiError> {
    apply(&state, id, Action::Start).await
}

pub async fn message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    apply(&state, id, Action::Text(payload.text)).await
}

pub async fn voice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoiceRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let audio = base64::engine::general_purpose::STANDARD
        .decode(payload.audio.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 audio: {}", e)))?;

    apply(&state, id, Action::Voice(audio)).await
}

pub async fn choose_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LanguageRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let language = payload
        .language
        .parse::<Language>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    apply(&state, id, Action::ChooseLanguage(language)).await
}

pub async fn submit_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CodeRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    apply(&state, id, Action::SubmitCode(payload.source_code)).await
}

pub async fn end(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnOutcome>, ApiError> {
    apply(&state, id, Action::End).await
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnOutcome>, ApiError> {
    apply(&state, id, Action::Reset).await
}

/// Run one action under the session's lock
async fn apply(state: &AppState, id: Uuid, action: Action) -> Result<Json<TurnOutcome>, ApiError> {
    let entry = state.sessions.get(&id).await.ok_or(ApiError::SessionNotFound(id))?;
    let mut session = entry.lock().await;

    let submission = matches!(action, Action::SubmitCode(_));
    let result = state.controller.handle(&mut session, action).await;
    metrics::observe(&result, submission);

    Ok(Json(result?))
}

/// GET /status - Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
        "grader_backend": state.grader_backend,
    }))
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_handler() -> impl IntoResponse {
    (StatusCode::OK, metrics::render())
}
