//! Fixtures shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::{macros::time, Date, Weekday};
use uuid::Uuid;

use crate::identity::dto::{RegisterProfessorRequest, RegisterStudentRequest};
use crate::identity::services::{register_professor, register_student};
use crate::identity::Session;
use crate::state::AppState;
use crate::store::{
    Attendance, Enrollment, Grade, MemoryStore, NewAttendance, NewGrade, NewProfessor, NewStudent,
    NewSubject, Professor, Role, Store, StoreError, StoreResult, Student, Subject, User,
};
use crate::subjects::dto::CreateSubjectRequest;

pub fn student_request(rfid: &str, name: &str) -> RegisterStudentRequest {
    RegisterStudentRequest {
        rfid: rfid.into(),
        full_name: name.into(),
        student_number: format!("2024-{rfid}"),
        year_section: "3-A".into(),
        course: "Computer Science".into(),
    }
}

pub fn professor_request(rfid: &str) -> RegisterProfessorRequest {
    RegisterProfessorRequest {
        rfid: rfid.into(),
        full_name: format!("Professor {rfid}"),
        staff_id: format!("STAFF-{rfid}"),
        academic_rank: "Associate Professor".into(),
    }
}

pub async fn professor_session(state: &AppState, rfid: &str) -> Session {
    let reg = register_professor(state, professor_request(rfid)).await.unwrap();
    Session {
        user_id: reg.user_id,
        role: Role::Professor,
    }
}

pub async fn student_session(state: &AppState, rfid: &str, name: &str) -> Session {
    let reg = register_student(state, student_request(rfid, name)).await.unwrap();
    Session {
        user_id: reg.user_id,
        role: Role::Student,
    }
}

/// Registers a student and returns the profile id.
pub async fn student_id(state: &AppState, rfid: &str, name: &str) -> Uuid {
    let session = student_session(state, rfid, name).await;
    state
        .store
        .student_by_user(session.user_id)
        .await
        .unwrap()
        .unwrap()
        .id
}

/// 09:00 to 10:30 on the given days.
pub fn subject_request(code: &str, days: Vec<Weekday>) -> CreateSubjectRequest {
    CreateSubjectRequest {
        subject_name: format!("Subject {code}"),
        subject_code: code.into(),
        units: 3,
        start_time: time!(9:00),
        end_time: time!(10:30),
        days,
    }
}

/// `MemoryStore` whose attendance and grade inserts fail for one enrollment.
#[derive(Default)]
pub struct BrokenInserts {
    inner: MemoryStore,
    broken: Mutex<Option<Uuid>>,
}

impl BrokenInserts {
    pub fn break_enrollment(&self, enrollment_id: Uuid) {
        *self.broken.lock().unwrap() = Some(enrollment_id);
    }

    fn check(&self, enrollment_id: Uuid) -> StoreResult<()> {
        if *self.broken.lock().unwrap() == Some(enrollment_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for BrokenInserts {
    async fn find_user_by_rfid(&self, rfid: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_rfid(rfid).await
    }
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }
    async fn create_student(&self, rfid: &str, profile: &NewStudent) -> StoreResult<(User, Student)> {
        self.inner.create_student(rfid, profile).await
    }
    async fn create_professor(&self, rfid: &str, profile: &NewProfessor) -> StoreResult<(User, Professor)> {
        self.inner.create_professor(rfid, profile).await
    }
    async fn student_by_user(&self, user_id: Uuid) -> StoreResult<Option<Student>> {
        self.inner.student_by_user(user_id).await
    }
    async fn professor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Professor>> {
        self.inner.professor_by_user(user_id).await
    }
    async fn students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>> {
        self.inner.students_by_ids(ids).await
    }
    async fn professors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Professor>> {
        self.inner.professors_by_ids(ids).await
    }
    async fn list_students(&self) -> StoreResult<Vec<(Student, String)>> {
        self.inner.list_students().await
    }
    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<Subject> {
        self.inner.insert_subject(subject).await
    }
    async fn update_subject(&self, subject: &Subject) -> StoreResult<Subject> {
        self.inner.update_subject(subject).await
    }
    async fn delete_subject(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_subject(id).await
    }
    async fn get_subject(&self, id: Uuid) -> StoreResult<Option<Subject>> {
        self.inner.get_subject(id).await
    }
    async fn subjects_by_professor(&self, professor_id: Uuid) -> StoreResult<Vec<Subject>> {
        self.inner.subjects_by_professor(professor_id).await
    }
    async fn subjects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Subject>> {
        self.inner.subjects_by_ids(ids).await
    }
    async fn insert_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<Enrollment> {
        self.inner.insert_enrollment(student_id, subject_id).await
    }
    async fn delete_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_enrollment(student_id, subject_id).await
    }
    async fn enrollments_by_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        self.inner.enrollments_by_student(student_id).await
    }
    async fn enrollments_by_subjects(&self, subject_ids: &[Uuid]) -> StoreResult<Vec<Enrollment>> {
        self.inner.enrollments_by_subjects(subject_ids).await
    }
    async fn insert_attendance_once(&self, row: &NewAttendance) -> StoreResult<Option<Attendance>> {
        self.check(row.enrollment_id)?;
        self.inner.insert_attendance_once(row).await
    }
    async fn attendance_since(&self, enrollment_ids: &[Uuid], since: Date) -> StoreResult<Vec<Attendance>> {
        self.inner.attendance_since(enrollment_ids, since).await
    }
    async fn insert_grade(&self, grade: &NewGrade) -> StoreResult<Grade> {
        self.check(grade.enrollment_id)?;
        self.inner.insert_grade(grade).await
    }
    async fn grades_by_enrollments(&self, enrollment_ids: &[Uuid]) -> StoreResult<Vec<Grade>> {
        self.inner.grades_by_enrollments(enrollment_ids).await
    }
}
