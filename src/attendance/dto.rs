use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::store::AttendanceStatus;

/// One attendance row written by a scan; surfaced to the kiosk as a notice.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceMark {
    pub attendance_id: Uuid,
    pub enrollment_id: Uuid,
    pub subject_id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub status: AttendanceStatus,
    pub minutes_late: i64,
    pub message: String,
}

/// Attendance row joined to its subject and student.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    pub id: Uuid,
    pub date: Date,
    pub status: AttendanceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
    pub subject_id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_number: String,
}
