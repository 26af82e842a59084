//! HTTP request handlers
//!
//! Interaction failures never surface as HTTP errors: they are reported in
//! the returned page. Only unknown sessions and unreadable bodies do.

use super::types::{
    ChatRequest, ErrorResponse, ModeRequest, ModelsResponse, PageForm, SessionResponse,
    SuccessResponse,
};
use super::AppState;
use crate::flow::UiEvent;
use crate::render::{render_document, PageView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Browser entry point
        .route("/", get(new_page))
        .route("/s/:id", get(show_page).post(submit_page))
        // JSON session API
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/mode", post(select_mode))
        .route("/api/sessions/:id/chat", post(send_chat))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

/// Run one interaction cycle on session `id`, holding its lock throughout
async fn run_event(state: &AppState, id: &str, event: UiEvent) -> Result<PageView, AppError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    let mut session = handle.lock().await;
    Ok(state.flow.run_page(&mut session, event).await)
}

// ============================================================
// HTML pages
// ============================================================

async fn new_page(State(state): State<AppState>) -> Redirect {
    let (id, _) = state.flow.initializer().open_session(&state.sessions).await;
    let live_sessions = state.sessions.len().await;
    tracing::info!(session_id = %id, live_sessions, "Session opened");
    Redirect::to(&format!("/s/{id}"))
}

async fn show_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let page = run_event(&state, &id, UiEvent::Load).await?;
    Ok(Html(render_document(&page)))
}

async fn submit_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PageForm>,
) -> Result<Html<String>, AppError> {
    let event = UiEvent::from_fields(form.mode, form.message);
    let page = run_event(&state, &id, event).await?;
    Ok(Html(render_document(&page)))
}

// ============================================================
// Session API
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let (session_id, handle) = state.flow.initializer().open_session(&state.sessions).await;
    tracing::info!(session_id = %session_id, "Session opened");
    let mut session = handle.lock().await;
    let page = state.flow.run_page(&mut session, UiEvent::Load).await;
    Json(SessionResponse { session_id, page })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PageView>, AppError> {
    run_event(&state, &id, UiEvent::Load).await.map(Json)
}

async fn select_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<PageView>, AppError> {
    run_event(&state, &id, UiEvent::SelectMode { mode: req.mode })
        .await
        .map(Json)
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<PageView>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }
    let event = UiEvent::Submit {
        message: req.message,
        mode: req.mode,
    };
    run_event(&state, &id, event).await.map(Json)
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.remove(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    tracing::info!(session_id = %id, "Session closed");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Model Info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.available_model_info(),
        default: state.llm_registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("deskmate ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
