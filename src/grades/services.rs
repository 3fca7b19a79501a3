use std::collections::HashMap;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{GradeEntry, GradeFailure, RecordGradesRequest, RecordGradesResponse};
use crate::error::{ApiError, ApiResult};
use crate::identity::Session;
use crate::state::AppState;
use crate::store::NewGrade;
use crate::subjects::{enrolled_students, owned_subject};

/// Inserts one grade row per entered score.
///
/// Rows are independent: a failed insert is reported in `failed` and the
/// ones already written stay.
pub async fn record_grades(
    state: &AppState,
    session: &Session,
    subject_id: Uuid,
    req: RecordGradesRequest,
) -> ApiResult<RecordGradesResponse> {
    owned_subject(state, session, subject_id).await?;

    let title = req.title.trim().to_string();
    let Some(grade_type) = req.grade_type.filter(|_| !title.is_empty()) else {
        return Err(ApiError::BadRequest(
            "Please select grade type and enter a title".into(),
        ));
    };

    let entered: Vec<(Uuid, f64)> = req
        .scores
        .into_iter()
        .filter_map(|(enrollment_id, score)| score.map(|s| (enrollment_id, s)))
        .collect();
    if entered.is_empty() {
        return Err(ApiError::BadRequest(
            "No scores entered: please enter at least one score".into(),
        ));
    }
    if !(req.max_score.is_finite() && req.max_score > 0.0) {
        return Err(ApiError::BadRequest("Max score must be greater than 0".into()));
    }

    let roster: Vec<Uuid> = enrolled_students(state.store.as_ref(), subject_id)
        .await?
        .into_iter()
        .map(|e| e.enrollment_id)
        .collect();

    let mut recorded = 0;
    let mut failed = Vec::new();
    for (enrollment_id, score) in entered {
        if !roster.contains(&enrollment_id) {
            failed.push(GradeFailure {
                enrollment_id,
                message: "Not enrolled in this subject".into(),
            });
            continue;
        }
        if !(score.is_finite() && score >= 0.0) {
            failed.push(GradeFailure {
                enrollment_id,
                message: "Score must be a non-negative number".into(),
            });
            continue;
        }

        let row = NewGrade {
            enrollment_id,
            grade_type,
            title: title.clone(),
            score,
            max_score: req.max_score,
        };
        match state.store.insert_grade(&row).await {
            Ok(_) => recorded += 1,
            Err(e) => {
                error!(error = %e, %enrollment_id, "grade insert failed");
                failed.push(GradeFailure {
                    enrollment_id,
                    message: e.to_string(),
                });
            }
        }
    }

    if !failed.is_empty() {
        warn!(%subject_id, failed = failed.len(), "some grades were not recorded");
    }
    info!(%subject_id, recorded, title = %title, "grades recorded");

    let message = if recorded == 0 {
        "Failed to record grades".to_string()
    } else {
        format!("Recorded {recorded} grades successfully")
    };
    Ok(RecordGradesResponse {
        recorded,
        failed,
        message,
    })
}

/// Grades of a subject, newest first, joined to student identity.
pub async fn list_grades(state: &AppState, session: &Session, subject_id: Uuid) -> ApiResult<Vec<GradeEntry>> {
    owned_subject(state, session, subject_id).await?;

    let roster: HashMap<Uuid, _> = enrolled_students(state.store.as_ref(), subject_id)
        .await?
        .into_iter()
        .map(|e| (e.enrollment_id, e))
        .collect();
    let ids: Vec<Uuid> = roster.keys().copied().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let grades = state.store.grades_by_enrollments(&ids).await?;
    Ok(grades
        .into_iter()
        .filter_map(|g| {
            let who = roster.get(&g.enrollment_id)?;
            Some(GradeEntry {
                id: g.id,
                enrollment_id: g.enrollment_id,
                grade_type: g.grade_type,
                title: g.title,
                score: g.score,
                max_score: g.max_score,
                created_at: g.created_at,
                student_id: who.student_id,
                student_name: who.full_name.clone(),
                student_number: who.student_number.clone(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use time::Weekday;

    use crate::store::GradeType;
    use crate::subjects::services::{create_subject, enroll};
    use crate::testing::{professor_session, student_id, subject_request, BrokenInserts};

    struct Class {
        state: AppState,
        prof: Session,
        subject_id: Uuid,
        enrollments: Vec<Uuid>,
    }

    async fn class_of_two() -> Class {
        class_of_two_on(AppState::fake()).await
    }

    async fn class_of_two_on(state: AppState) -> Class {
        let prof = professor_session(&state, "P-1").await;
        let subject = create_subject(&state, &prof, subject_request("CS1", vec![Weekday::Monday]))
            .await
            .unwrap();
        let mut enrollments = Vec::new();
        for (rfid, name) in [("S-1", "Ben Cruz"), ("S-2", "Cara Lim")] {
            let sid = student_id(&state, rfid, name).await;
            enrollments.push(enroll(&state, &prof, subject.id, sid).await.unwrap().id);
        }
        Class {
            state,
            prof,
            subject_id: subject.id,
            enrollments,
        }
    }

    fn request(scores: BTreeMap<Uuid, Option<f64>>) -> RecordGradesRequest {
        RecordGradesRequest {
            grade_type: Some(GradeType::Quiz),
            title: "Quiz 1".into(),
            max_score: 20.0,
            scores,
        }
    }

    #[tokio::test]
    async fn blank_scores_insert_nothing() {
        let c = class_of_two().await;
        let scores = c.enrollments.iter().map(|e| (*e, None)).collect();
        let err = record_grades(&c.state, &c.prof, c.subject_id, request(scores))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No scores entered"));
        assert!(c
            .state
            .store
            .grades_by_enrollments(&c.enrollments)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn missing_type_or_title_is_rejected() {
        let c = class_of_two().await;
        let scores: BTreeMap<_, _> = [(c.enrollments[0], Some(10.0))].into();
        let mut req = request(scores.clone());
        req.grade_type = None;
        assert!(matches!(
            record_grades(&c.state, &c.prof, c.subject_id, req).await,
            Err(ApiError::BadRequest(_))
        ));
        let mut req = request(scores);
        req.title = "   ".into();
        assert!(matches!(
            record_grades(&c.state, &c.prof, c.subject_id, req).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn entered_scores_become_rows_and_strangers_are_reported() {
        let c = class_of_two().await;
        let stranger = Uuid::new_v4();
        let scores: BTreeMap<_, _> = [
            (c.enrollments[0], Some(18.5)),
            (c.enrollments[1], None),
            (stranger, Some(3.0)),
        ]
        .into();
        let out = record_grades(&c.state, &c.prof, c.subject_id, request(scores))
            .await
            .unwrap();
        assert_eq!(out.recorded, 1);
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].enrollment_id, stranger);
        assert_eq!(out.message, "Recorded 1 grades successfully");

        let listed = list_grades(&c.state, &c.prof, c.subject_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].student_name, "Ben Cruz");
        assert_eq!(listed[0].score, 18.5);
        assert_eq!(listed[0].max_score, 20.0);
    }

    #[tokio::test]
    async fn failed_insert_is_reported_and_others_are_kept() {
        let store = Arc::new(BrokenInserts::default());
        let c = class_of_two_on(AppState::fake_with_store(store.clone())).await;
        store.break_enrollment(c.enrollments[0]);

        let scores: BTreeMap<_, _> = [(c.enrollments[0], Some(12.0)), (c.enrollments[1], Some(15.0))].into();
        let out = record_grades(&c.state, &c.prof, c.subject_id, request(scores))
            .await
            .unwrap();
        assert_eq!(out.recorded, 1);
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].enrollment_id, c.enrollments[0]);

        let listed = list_grades(&c.state, &c.prof, c.subject_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].enrollment_id, c.enrollments[1]);
    }

    #[tokio::test]
    async fn duplicate_titles_accumulate() {
        let c = class_of_two().await;
        for _ in 0..2 {
            let scores: BTreeMap<_, _> = [(c.enrollments[1], Some(7.0))].into();
            record_grades(&c.state, &c.prof, c.subject_id, request(scores))
                .await
                .unwrap();
        }
        let listed = list_grades(&c.state, &c.prof, c.subject_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|g| g.title == "Quiz 1"));
    }
}
