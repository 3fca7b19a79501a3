use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{ProfessorDashboard, StudentDashboard};
use super::services;
use crate::error::ApiResult;
use crate::identity::Session;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/student/dashboard", get(student_dashboard))
        .route("/professor/dashboard", get(professor_dashboard))
}

#[instrument(skip(state))]
pub async fn student_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<StudentDashboard>> {
    services::student_dashboard(&state, &session, state.now())
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn professor_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<ProfessorDashboard>> {
    services::professor_dashboard(&state, &session, state.now())
        .await
        .map(Json)
}
