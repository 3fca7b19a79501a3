use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime, Time, Weekday};
use uuid::Uuid;

use crate::schedule;

/// Role fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "grade_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    Exam,
    Quiz,
    Activity,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub rfid: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub student_number: String,
    pub year_section: String,
    pub course: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Professor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub staff_id: String,
    pub academic_rank: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub professor_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub units: i32,
    #[serde(with = "schedule::clock")]
    pub start_time: Time,
    #[serde(with = "schedule::clock")]
    pub end_time: Time,
    #[serde(with = "schedule::weekdays")]
    pub days: Vec<Weekday>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Subject {
    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Inclusive on both ends.
    pub fn in_session_at(&self, t: Time) -> bool {
        t >= self.start_time && t <= self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub date: Date,
    pub status: AttendanceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub grade_type: GradeType,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// ---- insert payloads ----

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub full_name: String,
    pub student_number: String,
    pub year_section: String,
    pub course: String,
}

#[derive(Debug, Clone)]
pub struct NewProfessor {
    pub full_name: String,
    pub staff_id: String,
    pub academic_rank: String,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub professor_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub units: i32,
    pub start_time: Time,
    pub end_time: Time,
    pub days: Vec<Weekday>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub enrollment_id: Uuid,
    pub date: Date,
    pub status: AttendanceStatus,
    pub scanned_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGrade {
    pub enrollment_id: Uuid,
    pub grade_type: GradeType,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
}
