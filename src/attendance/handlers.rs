use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::AttendanceEntry;
use super::services::{history_for_subjects, window_start};
use crate::error::ApiResult;
use crate::identity::Session;
use crate::state::AppState;
use crate::subjects::owned_subject;

pub fn attendance_routes() -> Router<AppState> {
    Router::new().route("/subjects/:id/attendance", get(subject_attendance))
}

/// Attendance of one owned subject over the configured rolling window.
#[instrument(skip(state))]
pub async fn subject_attendance(
    State(state): State<AppState>,
    session: Session,
    Path(subject_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AttendanceEntry>>> {
    let (_, subject) = owned_subject(&state, &session, subject_id).await?;
    let since = window_start(state.now().date(), state.config.attendance.history_days);
    let entries = history_for_subjects(state.store.as_ref(), std::slice::from_ref(&subject), since).await?;
    Ok(Json(entries))
}
