use std::collections::HashMap;

use time::Date;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::dto::{AttendanceEntry, AttendanceMark};
use crate::config::AttendancePolicy;
use crate::schedule::{minutes_since_midnight, Moment};
use crate::store::{AttendanceStatus, NewAttendance, Store, StoreResult, Subject};

pub fn classify(policy: &AttendancePolicy, minutes_late: i64) -> AttendanceStatus {
    if minutes_late > policy.absent_after_minutes {
        AttendanceStatus::Absent
    } else if minutes_late > policy.late_after_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Records attendance for every class of the student that is in session at `now`.
///
/// A class qualifies when it meets on today's weekday and `now` lies within
/// `[start, end]` at minute precision. Each qualifying enrollment gets at most
/// one row per date; the store rejects the second one atomically. A failed
/// insert is logged and the remaining enrollments are still processed.
pub async fn process_attendance(
    store: &dyn Store,
    policy: &AttendancePolicy,
    student_id: Uuid,
    now: Moment,
) -> StoreResult<Vec<AttendanceMark>> {
    let enrollments = store.enrollments_by_student(student_id).await?;
    if enrollments.is_empty() {
        return Ok(Vec::new());
    }

    let subject_ids: Vec<Uuid> = enrollments.iter().map(|e| e.subject_id).collect();
    let subjects: HashMap<Uuid, Subject> = store
        .subjects_by_ids(&subject_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let today = now.weekday();
    let clock = now.time_of_day();
    let date = now.date();

    let mut marks = Vec::new();
    for enrollment in &enrollments {
        let Some(subject) = subjects.get(&enrollment.subject_id) else {
            warn!(enrollment_id = %enrollment.id, "enrollment points at a missing subject");
            continue;
        };
        if !subject.meets_on(today) || !subject.in_session_at(clock) {
            continue;
        }

        let minutes_late = minutes_since_midnight(clock) - minutes_since_midnight(subject.start_time);
        let status = classify(policy, minutes_late);
        let row = NewAttendance {
            enrollment_id: enrollment.id,
            date,
            status,
            scanned_at: now.at,
        };

        match store.insert_attendance_once(&row).await {
            Ok(Some(saved)) => {
                info!(
                    %student_id,
                    subject_code = %subject.subject_code,
                    status = status.as_str(),
                    minutes_late,
                    "attendance recorded"
                );
                marks.push(AttendanceMark {
                    attendance_id: saved.id,
                    enrollment_id: enrollment.id,
                    subject_id: subject.id,
                    subject_code: subject.subject_code.clone(),
                    subject_name: subject.subject_name.clone(),
                    status,
                    minutes_late,
                    message: format!("Attendance marked as {}", status.as_str().to_uppercase()),
                });
            }
            Ok(None) => {
                debug!(enrollment_id = %enrollment.id, %date, "attendance already recorded today");
            }
            Err(e) => {
                error!(error = %e, enrollment_id = %enrollment.id, "attendance insert failed");
            }
        }
    }
    Ok(marks)
}

/// First date of a rolling window of `days` dates ending today.
/// Saturates at `Date::MIN` instead of overflowing.
pub fn window_start(today: Date, days: i64) -> Date {
    i32::try_from(days.max(1) - 1)
        .ok()
        .and_then(|back| today.to_julian_day().checked_sub(back))
        .and_then(|jd| Date::from_julian_day(jd).ok())
        .unwrap_or(Date::MIN)
}

/// Attendance across `subjects` dated on or after `since`, newest first,
/// joined in memory to subject and student identity.
pub async fn history_for_subjects(
    store: &dyn Store,
    subjects: &[Subject],
    since: Date,
) -> StoreResult<Vec<AttendanceEntry>> {
    if subjects.is_empty() {
        return Ok(Vec::new());
    }
    let subject_ids: Vec<Uuid> = subjects.iter().map(|s| s.id).collect();
    let enrollments = store.enrollments_by_subjects(&subject_ids).await?;
    if enrollments.is_empty() {
        return Ok(Vec::new());
    }

    let enrollment_ids: Vec<Uuid> = enrollments.iter().map(|e| e.id).collect();
    let rows = store.attendance_since(&enrollment_ids, since).await?;

    let student_ids: Vec<Uuid> = enrollments.iter().map(|e| e.student_id).collect();
    let students: HashMap<Uuid, _> = store
        .students_by_ids(&student_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let subjects: HashMap<Uuid, &Subject> = subjects.iter().map(|s| (s.id, s)).collect();
    let enrollments: HashMap<Uuid, _> = enrollments.into_iter().map(|e| (e.id, e)).collect();

    let entries = rows
        .into_iter()
        .filter_map(|a| {
            let enrollment = enrollments.get(&a.enrollment_id)?;
            let subject = subjects.get(&enrollment.subject_id)?;
            let student = students.get(&enrollment.student_id)?;
            Some(AttendanceEntry {
                id: a.id,
                date: a.date,
                status: a.status,
                scanned_at: a.scanned_at,
                subject_id: subject.id,
                subject_code: subject.subject_code.clone(),
                subject_name: subject.subject_name.clone(),
                student_id: student.id,
                student_name: student.full_name.clone(),
                student_number: student.student_number.clone(),
            })
        })
        .collect();
    Ok(entries)
}
