use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GradeEntry, RecordGradesRequest, RecordGradesResponse};
use super::services;
use crate::error::ApiResult;
use crate::identity::Session;
use crate::state::AppState;

pub fn grade_routes() -> Router<AppState> {
    Router::new().route("/subjects/:id/grades", get(list_grades).post(record_grades))
}

#[instrument(skip(state, payload))]
pub async fn record_grades(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordGradesRequest>,
) -> ApiResult<Json<RecordGradesResponse>> {
    services::record_grades(&state, &session, id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn list_grades(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<GradeEntry>>> {
    services::list_grades(&state, &session, id).await.map(Json)
}
