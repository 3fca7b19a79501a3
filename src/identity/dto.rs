use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendance::AttendanceMark;
use crate::store::{Professor, Role, Student, User};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub rfid: String,
}

/// Where the kiosk goes after a scan.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanResponse {
    /// Unknown tag; the client shows registration for it.
    Register { rfid: String },
    Student {
        user_id: Uuid,
        token: String,
        marks: Vec<AttendanceMark>,
    },
    Professor { user_id: Uuid, token: String },
}

#[derive(Debug, Deserialize)]
pub struct RegisterStudentRequest {
    pub rfid: String,
    pub full_name: String,
    pub student_number: String,
    pub year_section: String,
    pub course: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterProfessorRequest {
    pub rfid: String,
    pub full_name: String,
    pub staff_id: String,
    pub academic_rank: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Student(Student),
    Professor(Professor),
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub profile: Option<Profile>,
}
