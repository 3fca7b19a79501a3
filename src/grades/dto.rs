use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::GradeType;

fn default_max_score() -> f64 {
    100.0
}

/// One assessment for many enrollments. Enrollments mapped to `null` were
/// left blank and are skipped.
#[derive(Debug, Deserialize)]
pub struct RecordGradesRequest {
    pub grade_type: Option<GradeType>,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub scores: BTreeMap<Uuid, Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct GradeFailure {
    pub enrollment_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RecordGradesResponse {
    pub recorded: usize,
    pub failed: Vec<GradeFailure>,
    pub message: String,
}

/// Grade joined to the graded student.
#[derive(Debug, Serialize)]
pub struct GradeEntry {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub grade_type: GradeType,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_number: String,
}
