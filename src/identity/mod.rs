use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod services;
mod session;

pub use session::Session;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::scan_routes())
        .merge(handlers::me_routes())
}
