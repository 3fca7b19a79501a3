use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", capitalize(what))),
            StoreError::Conflict(msg) => ApiError::Conflict(capitalize(&msg)),
            other => {
                error!(error = %other, "store failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(%status, error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let nf: ApiError = StoreError::NotFound("subject").into();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        assert_eq!(nf.to_string(), "Subject not found");

        let conflict: ApiError = StoreError::Conflict("enrollment already exists".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.to_string(), "Enrollment already exists");

        let db: ApiError = StoreError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
