//! Persistence boundary. Services talk to a [`Store`]; the server picks
//! [`PgStore`] when a database is configured and [`MemoryStore`] otherwise.

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

mod memory;
mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("malformed {table} row: {reason}")]
    Malformed { table: &'static str, reason: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // ---- identity ----
    async fn find_user_by_rfid(&self, rfid: &str) -> StoreResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Creates the user row and its student profile together.
    async fn create_student(&self, rfid: &str, profile: &NewStudent) -> StoreResult<(User, Student)>;
    /// Creates the user row and its professor profile together.
    async fn create_professor(
        &self,
        rfid: &str,
        profile: &NewProfessor,
    ) -> StoreResult<(User, Professor)>;
    async fn student_by_user(&self, user_id: Uuid) -> StoreResult<Option<Student>>;
    async fn professor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Professor>>;
    async fn students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>>;
    async fn professors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Professor>>;
    /// Every student with their tag, ordered by full name.
    async fn list_students(&self) -> StoreResult<Vec<(Student, String)>>;

    // ---- subjects ----
    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<Subject>;
    async fn update_subject(&self, subject: &Subject) -> StoreResult<Subject>;
    async fn delete_subject(&self, id: Uuid) -> StoreResult<bool>;
    async fn get_subject(&self, id: Uuid) -> StoreResult<Option<Subject>>;
    async fn subjects_by_professor(&self, professor_id: Uuid) -> StoreResult<Vec<Subject>>;
    async fn subjects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Subject>>;

    // ---- enrollments ----
    async fn insert_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<Enrollment>;
    /// Returns the number of rows removed.
    async fn delete_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<u64>;
    /// In enrollment order.
    async fn enrollments_by_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>>;
    async fn enrollments_by_subjects(&self, subject_ids: &[Uuid]) -> StoreResult<Vec<Enrollment>>;

    // ---- attendance ----
    /// Inserts unless a row for the same (enrollment, date) exists; `None` on conflict.
    async fn insert_attendance_once(&self, row: &NewAttendance) -> StoreResult<Option<Attendance>>;
    /// Rows dated on or after `since`, newest first.
    async fn attendance_since(&self, enrollment_ids: &[Uuid], since: Date) -> StoreResult<Vec<Attendance>>;

    // ---- grades ----
    async fn insert_grade(&self, grade: &NewGrade) -> StoreResult<Grade>;
    /// Newest first.
    async fn grades_by_enrollments(&self, enrollment_ids: &[Uuid]) -> StoreResult<Vec<Grade>>;
}
