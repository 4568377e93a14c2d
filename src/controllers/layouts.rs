//! layouts.rs
//!
//! Сеансы редактора раскладки.
//!
//! Оператор открывает сеанс формой площадки, двигает места, назначает им IP
//! через диалог и сохраняет результат в бэкенд площадок. Отклонённый перенос
//! места - обычный ответ 200 с `accepted: false`, а не ошибка.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::layout::{DragRejected, GenerationOutcome, IdentifierPrompt};
use crate::models::{SeatDefinition, SeatNumber, VenueDraft};
use crate::services::sessions::EditorSession;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(open_session))
        .route("/{sid}", axum::routing::get(get_session).delete(close_session))
        .route("/{sid}/generate", post(regenerate))
        .route("/{sid}/reset", post(reset_session))
        .route("/{sid}/seats/{seat}/drag", post(drag_seat))
        .route("/{sid}/seats/{seat}/prompt", post(open_prompt))
        .route("/{sid}/prompt", put(confirm_prompt).delete(cancel_prompt))
        .route("/{sid}/submit", post(submit_layout))
}

/* ---------- responses ---------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub draft: VenueDraft,
    pub cell_size: u32,
    pub generation: GenerationOutcome,
    pub seats: Vec<SeatDefinition>,
    pub prompt: Option<IdentifierPrompt>,
    pub submitting: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&EditorSession> for SessionResponse {
    fn from(session: &EditorSession) -> Self {
        Self {
            id: session.id,
            draft: session.draft.clone(),
            cell_size: session.editor.cell_size(),
            generation: session.last_generation,
            seats: session.editor.seats().to_vec(),
            prompt: session.editor.prompt().cloned(),
            submitting: session.submitting,
            created_at: session.created_at,
        }
    }
}

/* ---------- sessions ---------- */

// POST /api/layouts
// Бэкенд умеет только создавать площадки, поэтому сеанс всегда про новую.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpenSessionRequest {
    #[serde(default)]
    draft: VenueDraft,
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.open(req.draft).await;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

// GET /api/layouts/{sid}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.snapshot(sid).await?;
    Ok(Json(SessionResponse::from(&session)))
}

// DELETE /api/layouts/{sid}
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.close(sid).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/layouts/{sid}/generate
async fn regenerate(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
    Json(draft): Json<VenueDraft>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .sessions
        .with_session(sid, |session| {
            session.regenerate(draft);
            Ok(SessionResponse::from(&*session))
        })
        .await?;
    Ok(Json(response))
}

// POST /api/layouts/{sid}/reset
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .sessions
        .with_session(sid, |session| {
            session.reset();
            Ok(SessionResponse::from(&*session))
        })
        .await?;
    Ok(Json(response))
}

/* ---------- drag ---------- */

// POST /api/layouts/{sid}/seats/{seat}/drag
#[derive(Debug, Deserialize)]
struct DragRequest {
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<SeatDefinition>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<DragRejected>,
}

impl From<Result<SeatDefinition, DragRejected>> for DragResponse {
    fn from(outcome: Result<SeatDefinition, DragRejected>) -> Self {
        match outcome {
            Ok(seat) => Self {
                accepted: true,
                seat: Some(seat),
                rejection: None,
            },
            Err(rejection) => Self {
                accepted: false,
                seat: None,
                rejection: Some(rejection),
            },
        }
    }
}

async fn drag_seat(
    State(state): State<Arc<AppState>>,
    Path((sid, seat)): Path<(Uuid, SeatNumber)>,
    Json(req): Json<DragRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .sessions
        .with_session(sid, |session| {
            let editor = &mut session.editor;
            Ok(editor
                .begin_drag(seat)
                .and_then(|()| editor.end_drag(seat, req.x, req.y)))
        })
        .await?;
    Ok(Json(DragResponse::from(outcome)))
}

/* ---------- identifier prompt ---------- */

// POST /api/layouts/{sid}/seats/{seat}/prompt
async fn open_prompt(
    State(state): State<Arc<AppState>>,
    Path((sid, seat)): Path<(Uuid, SeatNumber)>,
) -> Result<impl IntoResponse, AppError> {
    let prompt = state
        .sessions
        .with_session(sid, |session| Ok(session.editor.open_identifier_prompt(seat)?.clone()))
        .await?;
    Ok(Json(prompt))
}

// PUT /api/layouts/{sid}/prompt
#[derive(Debug, Deserialize)]
struct ConfirmPromptRequest {
    #[serde(default)]
    value: String,
}

async fn confirm_prompt(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
    Json(req): Json<ConfirmPromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let seat = state
        .sessions
        .with_session(sid, |session| Ok(session.editor.confirm_identifier(&req.value)?))
        .await?;
    Ok(Json(seat))
}

// DELETE /api/layouts/{sid}/prompt
async fn cancel_prompt(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .sessions
        .with_session(sid, |session| {
            session.editor.cancel_identifier_prompt();
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- submit ---------- */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submitted_seats: usize,
}

// POST /api/layouts/{sid}/submit
async fn submit_layout(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // на время вызова бэкенда сеанс помечен и не меняется
    let session = state.sessions.begin_submit(sid).await?;
    let outcome = submit_session(&state, &session).await;
    state.sessions.finish_submit(sid, outcome.is_ok()).await;

    let submitted_seats = outcome?;
    info!("Layout session {} submitted with {} seats", sid, submitted_seats);
    Ok((StatusCode::CREATED, Json(SubmitResponse { submitted_seats })))
}

async fn submit_session(state: &AppState, session: &EditorSession) -> Result<usize, AppError> {
    session.draft.validate()?;
    let seats = session.editor.to_submission();
    if seats.is_empty() {
        return Err(AppError::BadRequest("layout has no seats".to_string()));
    }
    state
        .upstream
        .submit_layout(&session.draft, &seats, session.editor.cell_size())
        .await?;
    Ok(seats.len())
}
