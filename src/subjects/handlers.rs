use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CreateSubjectRequest, EnrollRequest, EnrolledStudent, StudentListing, StudentSearch,
    UpdateSubjectRequest,
};
use super::services;
use crate::error::ApiResult;
use crate::identity::Session;
use crate::state::AppState;
use crate::store::{Enrollment, Subject};

pub fn subject_routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", post(create_subject))
        .route("/subjects/:id", patch(update_subject).delete(delete_subject))
}

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students))
        .route(
            "/subjects/:id/enrollments",
            get(list_enrolled).post(enroll_student),
        )
        .route(
            "/subjects/:id/enrollments/:student_id",
            delete(unenroll_student),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_subject(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateSubjectRequest>,
) -> ApiResult<(StatusCode, Json<Subject>)> {
    let subject = services::create_subject(&state, &session, payload).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[instrument(skip(state, payload))]
pub async fn update_subject(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> ApiResult<Json<Subject>> {
    services::update_subject(&state, &session, id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    services::delete_subject(&state, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    session: Session,
    Query(search): Query<StudentSearch>,
) -> ApiResult<Json<Vec<StudentListing>>> {
    services::search_students(&state, &session, search)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn list_enrolled(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<EnrolledStudent>>> {
    services::owned_subject(&state, &session, id).await?;
    let rows = services::enrolled_students(state.store.as_ref(), id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn enroll_student(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<Enrollment>)> {
    let enrollment = services::enroll(&state, &session, id, payload.student_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[instrument(skip(state))]
pub async fn unenroll_student(
    State(state): State<AppState>,
    session: Session,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    services::unenroll(&state, &session, id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
