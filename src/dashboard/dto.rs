use serde::Serialize;
use time::Date;

use crate::attendance::AttendanceEntry;
use crate::store::{Professor, Student, Subject};
use crate::subjects::dto::SubjectSummary;

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledSubject {
    #[serde(flatten)]
    pub subject: Subject,
    pub professor_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentDashboard {
    pub profile: Student,
    pub subjects: Vec<ScheduledSubject>,
    pub next_class: Option<ScheduledSubject>,
}

#[derive(Debug, Serialize)]
pub struct ProfessorDashboard {
    pub profile: Professor,
    pub subjects: Vec<SubjectSummary>,
    /// First date of `recent_attendance`.
    pub since: Date,
    pub recent_attendance: Vec<AttendanceEntry>,
}
