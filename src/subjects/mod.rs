use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod services;

pub use services::{current_professor, enrolled_students, owned_subject, subject_summaries};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::subject_routes())
        .merge(handlers::enrollment_routes())
}
