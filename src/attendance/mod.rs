use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod services;

pub use dto::{AttendanceEntry, AttendanceMark};
pub use services::{history_for_subjects, process_attendance, window_start};

pub fn router() -> Router<AppState> {
    handlers::attendance_routes()
}
