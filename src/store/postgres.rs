use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::{Date, OffsetDateTime, Time, Weekday};
use tracing::debug;
use uuid::Uuid;

use super::{
    Attendance, Enrollment, Grade, NewAttendance, NewGrade, NewProfessor, NewStudent, NewSubject,
    Professor, Role, Store, StoreError, StoreResult, Student, Subject, User,
};
use crate::schedule::{parse_weekday, weekday_name};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// `subjects` as stored: days are a `text[]` of names.
#[derive(Debug, FromRow)]
struct SubjectRow {
    id: Uuid,
    professor_id: Uuid,
    subject_name: String,
    subject_code: String,
    units: i32,
    start_time: Time,
    end_time: Time,
    days: Vec<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<SubjectRow> for Subject {
    type Error = StoreError;

    fn try_from(r: SubjectRow) -> Result<Self, Self::Error> {
        let days = r
            .days
            .iter()
            .map(|d| {
                parse_weekday(d).ok_or_else(|| StoreError::Malformed {
                    table: "subjects",
                    reason: format!("unknown day {d:?}"),
                })
            })
            .collect::<Result<Vec<Weekday>, _>>()?;
        Ok(Subject {
            id: r.id,
            professor_id: r.professor_id,
            subject_name: r.subject_name,
            subject_code: r.subject_code,
            units: r.units,
            start_time: r.start_time,
            end_time: r.end_time,
            days,
            created_at: r.created_at,
        })
    }
}

fn day_names(days: &[Weekday]) -> Vec<String> {
    days.iter().map(|d| weekday_name(*d).to_string()).collect()
}

fn rows_to_subjects(rows: Vec<SubjectRow>) -> StoreResult<Vec<Subject>> {
    rows.into_iter().map(Subject::try_from).collect()
}

fn unique_as_conflict(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{what} already exists"))
        }
        _ => StoreError::Database(e),
    }
}

const USER_COLS: &str = "id, rfid, role, created_at";
const STUDENT_COLS: &str =
    "id, user_id, full_name, student_number, year_section, course, created_at";
const PROFESSOR_COLS: &str = "id, user_id, full_name, staff_id, academic_rank, created_at";
const SUBJECT_COLS: &str = "id, professor_id, subject_name, subject_code, units, start_time, \
                            end_time, days, created_at";
const ATTENDANCE_COLS: &str = "id, enrollment_id, date, status, scanned_at, created_at";
const GRADE_COLS: &str = "id, enrollment_id, grade_type, title, score, max_score, created_at";

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_rfid(&self, rfid: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE rfid = $1"))
            .bind(rfid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_student(&self, rfid: &str, profile: &NewStudent) -> StoreResult<(User, Student)> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (rfid, role) VALUES ($1, $2) RETURNING {USER_COLS}"
        ))
        .bind(rfid)
        .bind(Role::Student)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_as_conflict(e, "RFID"))?;

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (user_id, full_name, student_number, year_section, course)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDENT_COLS}
            "#
        ))
        .bind(user.id)
        .bind(&profile.full_name)
        .bind(&profile.student_number)
        .bind(&profile.year_section)
        .bind(&profile.course)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(user_id = %user.id, student_id = %student.id, "student row created");
        Ok((user, student))
    }

    async fn create_professor(
        &self,
        rfid: &str,
        profile: &NewProfessor,
    ) -> StoreResult<(User, Professor)> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (rfid, role) VALUES ($1, $2) RETURNING {USER_COLS}"
        ))
        .bind(rfid)
        .bind(Role::Professor)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_as_conflict(e, "RFID"))?;

        let professor = sqlx::query_as::<_, Professor>(&format!(
            r#"
            INSERT INTO professors (user_id, full_name, staff_id, academic_rank)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROFESSOR_COLS}
            "#
        ))
        .bind(user.id)
        .bind(&profile.full_name)
        .bind(&profile.staff_id)
        .bind(&profile.academic_rank)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(user_id = %user.id, professor_id = %professor.id, "professor row created");
        Ok((user, professor))
    }

    async fn student_by_user(&self, user_id: Uuid) -> StoreResult<Option<Student>> {
        let row = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLS} FROM students WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn professor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Professor>> {
        let row = sqlx::query_as::<_, Professor>(&format!(
            "SELECT {PROFESSOR_COLS} FROM professors WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>> {
        let rows = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLS} FROM students WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn professors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Professor>> {
        let rows = sqlx::query_as::<_, Professor>(&format!(
            "SELECT {PROFESSOR_COLS} FROM professors WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_students(&self) -> StoreResult<Vec<(Student, String)>> {
        #[derive(FromRow)]
        struct Row {
            #[sqlx(flatten)]
            student: Student,
            rfid: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT s.id, s.user_id, s.full_name, s.student_number, s.year_section, s.course,
                   s.created_at, u.rfid
              FROM students s
              JOIN users u ON u.id = s.user_id
             ORDER BY s.full_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.student, r.rfid)).collect())
    }

    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<Subject> {
        let row = sqlx::query_as::<_, SubjectRow>(&format!(
            r#"
            INSERT INTO subjects
                (professor_id, subject_name, subject_code, units, start_time, end_time, days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SUBJECT_COLS}
            "#
        ))
        .bind(subject.professor_id)
        .bind(&subject.subject_name)
        .bind(&subject.subject_code)
        .bind(subject.units)
        .bind(subject.start_time)
        .bind(subject.end_time)
        .bind(day_names(&subject.days))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_subject(&self, subject: &Subject) -> StoreResult<Subject> {
        let row = sqlx::query_as::<_, SubjectRow>(&format!(
            r#"
            UPDATE subjects
               SET subject_name = $2, subject_code = $3, units = $4,
                   start_time = $5, end_time = $6, days = $7
             WHERE id = $1
            RETURNING {SUBJECT_COLS}
            "#
        ))
        .bind(subject.id)
        .bind(&subject.subject_name)
        .bind(&subject.subject_code)
        .bind(subject.units)
        .bind(subject.start_time)
        .bind(subject.end_time)
        .bind(day_names(&subject.days))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("subject"))?;
        row.try_into()
    }

    async fn delete_subject(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_subject(&self, id: Uuid) -> StoreResult<Option<Subject>> {
        let row = sqlx::query_as::<_, SubjectRow>(&format!(
            "SELECT {SUBJECT_COLS} FROM subjects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Subject::try_from).transpose()
    }

    async fn subjects_by_professor(&self, professor_id: Uuid) -> StoreResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, SubjectRow>(&format!(
            "SELECT {SUBJECT_COLS} FROM subjects WHERE professor_id = $1 ORDER BY created_at ASC"
        ))
        .bind(professor_id)
        .fetch_all(&self.pool)
        .await?;
        rows_to_subjects(rows)
    }

    async fn subjects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Subject>> {
        let rows = sqlx::query_as::<_, SubjectRow>(&format!(
            "SELECT {SUBJECT_COLS} FROM subjects WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        rows_to_subjects(rows)
    }

    async fn insert_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<Enrollment> {
        let row = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, subject_id)
            VALUES ($1, $2)
            RETURNING id, student_id, subject_id, created_at
            "#,
        )
        .bind(student_id)
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_conflict(e, "enrollment"))?;
        Ok(row)
    }

    async fn delete_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM enrollments WHERE student_id = $1 AND subject_id = $2")
            .bind(student_id)
            .bind(subject_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn enrollments_by_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, subject_id, created_at
              FROM enrollments
             WHERE student_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn enrollments_by_subjects(&self, subject_ids: &[Uuid]) -> StoreResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, subject_id, created_at
              FROM enrollments
             WHERE subject_id = ANY($1)
             ORDER BY created_at ASC
            "#,
        )
        .bind(subject_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_attendance_once(&self, row: &NewAttendance) -> StoreResult<Option<Attendance>> {
        let inserted = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO attendance (enrollment_id, date, status, scanned_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (enrollment_id, date) DO NOTHING
            RETURNING {ATTENDANCE_COLS}
            "#
        ))
        .bind(row.enrollment_id)
        .bind(row.date)
        .bind(row.status)
        .bind(row.scanned_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn attendance_since(&self, enrollment_ids: &[Uuid], since: Date) -> StoreResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {ATTENDANCE_COLS}
              FROM attendance
             WHERE enrollment_id = ANY($1) AND date >= $2
             ORDER BY date DESC, scanned_at DESC
            "#
        ))
        .bind(enrollment_ids)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_grade(&self, grade: &NewGrade) -> StoreResult<Grade> {
        let row = sqlx::query_as::<_, Grade>(&format!(
            r#"
            INSERT INTO grades (enrollment_id, grade_type, title, score, max_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GRADE_COLS}
            "#
        ))
        .bind(grade.enrollment_id)
        .bind(grade.grade_type)
        .bind(&grade.title)
        .bind(grade.score)
        .bind(grade.max_score)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn grades_by_enrollments(&self, enrollment_ids: &[Uuid]) -> StoreResult<Vec<Grade>> {
        let rows = sqlx::query_as::<_, Grade>(&format!(
            r#"
            SELECT {GRADE_COLS}
              FROM grades
             WHERE enrollment_id = ANY($1)
             ORDER BY created_at DESC
            "#
        ))
        .bind(enrollment_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
