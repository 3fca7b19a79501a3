use std::collections::HashMap;

use uuid::Uuid;

use super::dto::{ProfessorDashboard, ScheduledSubject, StudentDashboard};
use crate::attendance::{history_for_subjects, window_start};
use crate::error::{ApiError, ApiResult};
use crate::identity::Session;
use crate::schedule::Moment;
use crate::state::AppState;
use crate::store::Role;
use crate::subjects::{current_professor, subject_summaries};

/// First subject, in list order, meeting today and starting strictly after now.
pub fn next_class(subjects: &[ScheduledSubject], now: Moment) -> Option<ScheduledSubject> {
    let day = now.weekday();
    let clock = now.time_of_day();
    subjects
        .iter()
        .find(|s| s.subject.meets_on(day) && s.subject.start_time > clock)
        .cloned()
}

pub async fn student_dashboard(state: &AppState, session: &Session, now: Moment) -> ApiResult<StudentDashboard> {
    session.require(Role::Student)?;
    let store = state.store.as_ref();
    let profile = store
        .student_by_user(session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student profile not found".into()))?;

    let enrollments = store.enrollments_by_student(profile.id).await?;
    let subject_ids: Vec<Uuid> = enrollments.iter().map(|e| e.subject_id).collect();
    let mut subjects: HashMap<Uuid, _> = if subject_ids.is_empty() {
        HashMap::new()
    } else {
        store
            .subjects_by_ids(&subject_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect()
    };

    let professor_ids: Vec<Uuid> = subjects.values().map(|s| s.professor_id).collect();
    let professors: HashMap<Uuid, String> = if professor_ids.is_empty() {
        HashMap::new()
    } else {
        store
            .professors_by_ids(&professor_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.full_name))
            .collect()
    };

    // Enrollment order drives both the listing and the next-class pick.
    let scheduled: Vec<ScheduledSubject> = enrollments
        .iter()
        .filter_map(|e| subjects.remove(&e.subject_id))
        .map(|subject| ScheduledSubject {
            professor_name: professors.get(&subject.professor_id).cloned(),
            subject,
        })
        .collect();

    Ok(StudentDashboard {
        next_class: next_class(&scheduled, now),
        profile,
        subjects: scheduled,
    })
}

pub async fn professor_dashboard(
    state: &AppState,
    session: &Session,
    now: Moment,
) -> ApiResult<ProfessorDashboard> {
    let profile = current_professor(state, session).await?;
    let store = state.store.as_ref();

    let subjects = subject_summaries(store, profile.id).await?;
    let owned: Vec<_> = subjects.iter().map(|s| s.subject.clone()).collect();
    let since = window_start(now.date(), state.config.attendance.history_days);
    let recent_attendance = history_for_subjects(store, &owned, since).await?;

    Ok(ProfessorDashboard {
        profile,
        subjects,
        since,
        recent_attendance,
    })
}
