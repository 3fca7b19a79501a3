use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{
    MeResponse, Profile, RegisterProfessorRequest, RegisterResponse, RegisterStudentRequest,
    ScanResponse,
};
use super::session::SessionKeys;
use crate::attendance::process_attendance;
use crate::error::{ApiError, ApiResult};
use crate::schedule::Moment;
use crate::state::AppState;
use crate::store::{NewProfessor, NewStudent, Role};

/// Trims the scanned value and checks it looks like a tag.
pub(crate) fn normalize_rfid(raw: &str) -> ApiResult<String> {
    lazy_static! {
        static ref RFID_RE: Regex = Regex::new(r"^[A-Za-z0-9:_-]{1,64}$").unwrap();
    }
    let tag = raw.trim();
    if tag.is_empty() {
        return Err(ApiError::BadRequest("Please enter an RFID".into()));
    }
    if !RFID_RE.is_match(tag) {
        return Err(ApiError::BadRequest("Invalid RFID".into()));
    }
    Ok(tag.to_string())
}

fn required(field: &'static str, value: &str) -> ApiResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(v.to_string())
}

fn session_token(keys: &SessionKeys, user_id: Uuid, role: Role) -> ApiResult<String> {
    keys.sign(user_id, role).map_err(|e| {
        error!(error = %e, "session sign failed");
        ApiError::Internal(e.to_string())
    })
}

/// Resolves a scanned tag. Unknown tags never create rows.
pub async fn scan(state: &AppState, raw_rfid: &str, now: Moment) -> ApiResult<ScanResponse> {
    let rfid = normalize_rfid(raw_rfid)?;

    let Some(user) = state.store.find_user_by_rfid(&rfid).await? else {
        info!(%rfid, "unregistered tag scanned");
        return Ok(ScanResponse::Register { rfid });
    };

    let keys = SessionKeys::from_ref(state);
    let token = session_token(&keys, user.id, user.role)?;

    match user.role {
        Role::Student => {
            let marks = match state.store.student_by_user(user.id).await? {
                Some(student) => {
                    match process_attendance(state.store.as_ref(), &state.config.attendance, student.id, now)
                        .await
                    {
                        Ok(marks) => marks,
                        Err(e) => {
                            error!(error = %e, student_id = %student.id, "attendance processing failed");
                            Vec::new()
                        }
                    }
                }
                None => {
                    warn!(user_id = %user.id, "student user has no profile");
                    Vec::new()
                }
            };
            info!(user_id = %user.id, marks = marks.len(), "student scanned in");
            Ok(ScanResponse::Student {
                user_id: user.id,
                token,
                marks,
            })
        }
        Role::Professor => {
            info!(user_id = %user.id, "professor scanned in");
            Ok(ScanResponse::Professor {
                user_id: user.id,
                token,
            })
        }
    }
}

pub async fn register_student(state: &AppState, req: RegisterStudentRequest) -> ApiResult<RegisterResponse> {
    let rfid = normalize_rfid(&req.rfid)?;
    let profile = NewStudent {
        full_name: required("Full name", &req.full_name)?,
        student_number: required("Student number", &req.student_number)?,
        year_section: required("Year & section", &req.year_section)?,
        course: required("Course", &req.course)?,
    };

    let (user, student) = state.store.create_student(&rfid, &profile).await?;
    let token = session_token(&SessionKeys::from_ref(state), user.id, user.role)?;

    info!(user_id = %user.id, student_id = %student.id, "student registered");
    Ok(RegisterResponse {
        user_id: user.id,
        role: user.role,
        token,
        message: "Registration successful!".into(),
    })
}

pub async fn register_professor(
    state: &AppState,
    req: RegisterProfessorRequest,
) -> ApiResult<RegisterResponse> {
    let rfid = normalize_rfid(&req.rfid)?;
    let profile = NewProfessor {
        full_name: required("Full name", &req.full_name)?,
        staff_id: required("Staff ID", &req.staff_id)?,
        academic_rank: required("Academic rank", &req.academic_rank)?,
    };

    let (user, professor) = state.store.create_professor(&rfid, &profile).await?;
    let token = session_token(&SessionKeys::from_ref(state), user.id, user.role)?;

    info!(user_id = %user.id, professor_id = %professor.id, "professor registered");
    Ok(RegisterResponse {
        user_id: user.id,
        role: user.role,
        token,
        message: "Registration successful!".into(),
    })
}

pub async fn me(state: &AppState, user_id: Uuid) -> ApiResult<MeResponse> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    let profile = match user.role {
        Role::Student => state.store.student_by_user(user.id).await?.map(Profile::Student),
        Role::Professor => state
            .store
            .professor_by_user(user.id)
            .await?
            .map(Profile::Professor),
    };
    Ok(MeResponse { user, profile })
}
