use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    MeResponse, RegisterProfessorRequest, RegisterResponse, RegisterStudentRequest, ScanRequest,
    ScanResponse,
};
use super::services;
use super::session::Session;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(scan))
        .route("/register/student", post(register_student))
        .route("/register/professor", post(register_professor))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn scan(
    State(state): State<AppState>,
    Json(payload): Json<ScanRequest>,
) -> ApiResult<Json<ScanResponse>> {
    let now = state.now();
    services::scan(&state, &payload.rfid, now).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterStudentRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let out = services::register_student(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state, payload))]
pub async fn register_professor(
    State(state): State<AppState>,
    Json(payload): Json<RegisterProfessorRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let out = services::register_professor(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, session: Session) -> ApiResult<Json<MeResponse>> {
    services::me(&state, session.user_id).await.map(Json)
}
