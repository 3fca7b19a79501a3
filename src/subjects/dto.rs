use serde::{Deserialize, Serialize};
use time::{Time, Weekday};
use uuid::Uuid;

use crate::schedule;
use crate::store::{Student, Subject};

#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub subject_name: String,
    pub subject_code: String,
    pub units: i32,
    #[serde(with = "schedule::clock")]
    pub start_time: Time,
    #[serde(with = "schedule::clock")]
    pub end_time: Time,
    #[serde(default, with = "schedule::weekdays")]
    pub days: Vec<Weekday>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubjectRequest {
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub subject_code: Option<String>,
    #[serde(default)]
    pub units: Option<i32>,
    #[serde(default, with = "schedule::clock::option")]
    pub start_time: Option<Time>,
    #[serde(default, with = "schedule::clock::option")]
    pub end_time: Option<Time>,
    #[serde(default, with = "schedule::weekdays::option")]
    pub days: Option<Vec<Weekday>>,
}

#[derive(Debug, Serialize)]
pub struct SubjectSummary {
    #[serde(flatten)]
    pub subject: Subject,
    pub enrollment_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentSearch {
    pub q: Option<String>,
    /// When given, each listing says whether the student is enrolled in it.
    pub subject_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StudentListing {
    #[serde(flatten)]
    pub student: Student,
    pub rfid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudent {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub full_name: String,
    pub student_number: String,
    pub year_section: String,
    pub course: String,
}
