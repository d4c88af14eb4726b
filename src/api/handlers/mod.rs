use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::error::ApiError;
use crate::db::Database;
use crate::error::StoreError;
use crate::models::*;

/// Ids that are not UUIDs cannot name a stored note.
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| StoreError::not_found(id).into())
}

fn note_input(payload: Result<Json<NoteInput>, JsonRejection>) -> Result<NoteInput, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============================================================
// Health
// ============================================================

pub async fn health(State(db): State<Database>) -> (StatusCode, Json<HealthStatus>) {
    match db.ping().and_then(|_| db.count_notes()) {
        Ok(notes) => (StatusCode::OK, Json(HealthStatus::ok(notes))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus::unavailable()),
            )
        }
    }
}

// ============================================================
// Notes
// ============================================================

pub async fn list_notes(State(db): State<Database>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(db.list_notes()?))
}

pub async fn get_note(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(db.get_note(id)?))
}

pub async fn create_note(
    State(db): State<Database>,
    Extension(session): Extension<Session>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = db.create_note(note_input(payload)?)?;
    tracing::info!(note_id = %note.id, subject = %session.subject, session = %session.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(db): State<Database>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(&id)?;
    let note = db.update_note(id, note_input(payload)?)?;
    tracing::info!(note_id = %note.id, subject = %session.subject, session = %session.id, "Note updated");
    Ok(Json(note))
}

pub async fn delete_note(
    State(db): State<Database>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let id = parse_id(&id)?;
    let confirmation = db.delete_note(id)?;
    tracing::info!(note_id = %id, subject = %session.subject, session = %session.id, "Note deleted");
    Ok(Json(confirmation))
}
