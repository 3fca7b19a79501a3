use std::collections::{HashMap, HashSet};

use time::{Time, Weekday};
use tracing::info;
use uuid::Uuid;

use super::dto::{
    CreateSubjectRequest, EnrolledStudent, StudentListing, StudentSearch, SubjectSummary,
    UpdateSubjectRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::identity::Session;
use crate::state::AppState;
use crate::store::{Enrollment, NewSubject, Professor, Role, Store, StoreResult, Subject};

/// Professor profile behind a professor session.
pub async fn current_professor(state: &AppState, session: &Session) -> ApiResult<Professor> {
    session.require(Role::Professor)?;
    state
        .store
        .professor_by_user(session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professor profile not found".into()))
}

/// Loads a subject and checks the caller teaches it.
pub async fn owned_subject(
    state: &AppState,
    session: &Session,
    subject_id: Uuid,
) -> ApiResult<(Professor, Subject)> {
    let professor = current_professor(state, session).await?;
    let subject = state
        .store
        .get_subject(subject_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".into()))?;
    if subject.professor_id != professor.id {
        return Err(ApiError::Forbidden("Subject belongs to another professor".into()));
    }
    Ok((professor, subject))
}

/// Keeps the first occurrence of each day, in the given order.
fn dedup_days(days: Vec<Weekday>) -> Vec<Weekday> {
    let mut seen = HashSet::new();
    days.into_iter().filter(|d| seen.insert(*d)).collect()
}

struct SubjectFields {
    subject_name: String,
    subject_code: String,
    units: i32,
    start_time: Time,
    end_time: Time,
    days: Vec<Weekday>,
}

fn validate(fields: SubjectFields) -> ApiResult<SubjectFields> {
    let subject_name = fields.subject_name.trim().to_string();
    let subject_code = fields.subject_code.trim().to_string();
    if subject_name.is_empty() {
        return Err(ApiError::BadRequest("Subject name is required".into()));
    }
    if subject_code.is_empty() {
        return Err(ApiError::BadRequest("Subject code is required".into()));
    }
    if fields.units < 1 {
        return Err(ApiError::BadRequest("Units must be at least 1".into()));
    }
    if fields.days.is_empty() {
        return Err(ApiError::BadRequest("Please select at least one day".into()));
    }
    if fields.start_time >= fields.end_time {
        return Err(ApiError::BadRequest("Start time must be before end time".into()));
    }
    Ok(SubjectFields {
        subject_name,
        subject_code,
        days: dedup_days(fields.days),
        ..fields
    })
}

pub async fn create_subject(
    state: &AppState,
    session: &Session,
    req: CreateSubjectRequest,
) -> ApiResult<Subject> {
    let professor = current_professor(state, session).await?;
    let f = validate(SubjectFields {
        subject_name: req.subject_name,
        subject_code: req.subject_code,
        units: req.units,
        start_time: req.start_time,
        end_time: req.end_time,
        days: req.days,
    })?;

    let subject = state
        .store
        .insert_subject(&NewSubject {
            professor_id: professor.id,
            subject_name: f.subject_name,
            subject_code: f.subject_code,
            units: f.units,
            start_time: f.start_time,
            end_time: f.end_time,
            days: f.days,
        })
        .await?;
    info!(professor_id = %professor.id, subject_id = %subject.id, code = %subject.subject_code, "subject created");
    Ok(subject)
}

pub async fn update_subject(
    state: &AppState,
    session: &Session,
    subject_id: Uuid,
    req: UpdateSubjectRequest,
) -> ApiResult<Subject> {
    let (_, current) = owned_subject(state, session, subject_id).await?;
    let f = validate(SubjectFields {
        subject_name: req.subject_name.unwrap_or(current.subject_name.clone()),
        subject_code: req.subject_code.unwrap_or(current.subject_code.clone()),
        units: req.units.unwrap_or(current.units),
        start_time: req.start_time.unwrap_or(current.start_time),
        end_time: req.end_time.unwrap_or(current.end_time),
        days: req.days.unwrap_or(current.days.clone()),
    })?;

    let updated = state
        .store
        .update_subject(&Subject {
            subject_name: f.subject_name,
            subject_code: f.subject_code,
            units: f.units,
            start_time: f.start_time,
            end_time: f.end_time,
            days: f.days,
            ..current
        })
        .await?;
    info!(subject_id = %updated.id, "subject updated");
    Ok(updated)
}

pub async fn delete_subject(state: &AppState, session: &Session, subject_id: Uuid) -> ApiResult<()> {
    owned_subject(state, session, subject_id).await?;
    if !state.store.delete_subject(subject_id).await? {
        return Err(ApiError::NotFound("Subject not found".into()));
    }
    info!(%subject_id, "subject deleted");
    Ok(())
}

/// Subjects of a professor with their enrollment counts, in creation order.
pub async fn subject_summaries(store: &dyn Store, professor_id: Uuid) -> StoreResult<Vec<SubjectSummary>> {
    let subjects = store.subjects_by_professor(professor_id).await?;
    if subjects.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = subjects.iter().map(|s| s.id).collect();
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for e in store.enrollments_by_subjects(&ids).await? {
        *counts.entry(e.subject_id).or_default() += 1;
    }
    Ok(subjects
        .into_iter()
        .map(|subject| SubjectSummary {
            enrollment_count: counts.get(&subject.id).copied().unwrap_or(0),
            subject,
        })
        .collect())
}

/// Enrollments of a subject joined to student identity.
pub async fn enrolled_students(store: &dyn Store, subject_id: Uuid) -> StoreResult<Vec<EnrolledStudent>> {
    let enrollments = store.enrollments_by_subjects(&[subject_id]).await?;
    if enrollments.is_empty() {
        return Ok(Vec::new());
    }
    let student_ids: Vec<Uuid> = enrollments.iter().map(|e| e.student_id).collect();
    let students: HashMap<Uuid, _> = store
        .students_by_ids(&student_ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    Ok(enrollments
        .iter()
        .filter_map(|e| {
            let s = students.get(&e.student_id)?;
            Some(EnrolledStudent {
                enrollment_id: e.id,
                student_id: s.id,
                full_name: s.full_name.clone(),
                student_number: s.student_number.clone(),
                year_section: s.year_section.clone(),
                course: s.course.clone(),
            })
        })
        .collect())
}

/// Case-insensitive substring match over name, student number and tag.
fn matches_query(listing: &StudentListing, needle: &str) -> bool {
    [
        listing.student.full_name.as_str(),
        listing.student.student_number.as_str(),
        listing.rfid.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

pub async fn search_students(
    state: &AppState,
    session: &Session,
    search: StudentSearch,
) -> ApiResult<Vec<StudentListing>> {
    current_professor(state, session).await?;

    let enrolled: Option<HashSet<Uuid>> = match search.subject_id {
        Some(subject_id) => {
            owned_subject(state, session, subject_id).await?;
            let rows = state.store.enrollments_by_subjects(&[subject_id]).await?;
            Some(rows.into_iter().map(|e| e.student_id).collect())
        }
        None => None,
    };

    let needle = search
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    Ok(state
        .store
        .list_students()
        .await?
        .into_iter()
        .map(|(student, rfid)| StudentListing {
            enrolled: enrolled.as_ref().map(|set| set.contains(&student.id)),
            student,
            rfid,
        })
        .filter(|l| needle.as_deref().map_or(true, |n| matches_query(l, n)))
        .collect())
}

pub async fn enroll(
    state: &AppState,
    session: &Session,
    subject_id: Uuid,
    student_id: Uuid,
) -> ApiResult<Enrollment> {
    owned_subject(state, session, subject_id).await?;
    if state.store.students_by_ids(&[student_id]).await?.is_empty() {
        return Err(ApiError::NotFound("Student not found".into()));
    }
    let enrollment = state.store.insert_enrollment(student_id, subject_id).await?;
    info!(%subject_id, %student_id, "student enrolled");
    Ok(enrollment)
}

/// Removes exactly the (student, subject) enrollment.
pub async fn unenroll(
    state: &AppState,
    session: &Session,
    subject_id: Uuid,
    student_id: Uuid,
) -> ApiResult<()> {
    owned_subject(state, session, subject_id).await?;
    let removed = state.store.delete_enrollment(student_id, subject_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Enrollment not found".into()));
    }
    info!(%subject_id, %student_id, "student unenrolled");
    Ok(())
}
