use std::collections::HashSet;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Attendance, Enrollment, Grade, NewAttendance, NewGrade, NewProfessor, NewStudent, NewSubject,
    Professor, Role, Store, StoreError, StoreResult, Student, Subject, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    students: Vec<Student>,
    professors: Vec<Professor>,
    subjects: Vec<Subject>,
    enrollments: Vec<Enrollment>,
    attendance: Vec<Attendance>,
    grades: Vec<Grade>,
}

impl Tables {
    fn insert_user(&mut self, rfid: &str, role: Role) -> StoreResult<User> {
        if self.users.iter().any(|u| u.rfid == rfid) {
            return Err(StoreError::Conflict("RFID already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            rfid: rfid.to_string(),
            role,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn drop_enrollments(&mut self, gone: &HashSet<Uuid>) {
        self.enrollments.retain(|e| !gone.contains(&e.id));
        self.attendance.retain(|a| !gone.contains(&a.enrollment_id));
        self.grades.retain(|g| !gone.contains(&g.enrollment_id));
    }
}

/// In-process tables with the same uniqueness and cascade rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_rfid(&self, rfid: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.rfid == rfid).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_student(&self, rfid: &str, profile: &NewStudent) -> StoreResult<(User, Student)> {
        let mut t = self.tables.write().await;
        let user = t.insert_user(rfid, Role::Student)?;
        let student = Student {
            id: Uuid::new_v4(),
            user_id: user.id,
            full_name: profile.full_name.clone(),
            student_number: profile.student_number.clone(),
            year_section: profile.year_section.clone(),
            course: profile.course.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.students.push(student.clone());
        Ok((user, student))
    }

    async fn create_professor(
        &self,
        rfid: &str,
        profile: &NewProfessor,
    ) -> StoreResult<(User, Professor)> {
        let mut t = self.tables.write().await;
        let user = t.insert_user(rfid, Role::Professor)?;
        let professor = Professor {
            id: Uuid::new_v4(),
            user_id: user.id,
            full_name: profile.full_name.clone(),
            staff_id: profile.staff_id.clone(),
            academic_rank: profile.academic_rank.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.professors.push(professor.clone());
        Ok((user, professor))
    }

    async fn student_by_user(&self, user_id: Uuid) -> StoreResult<Option<Student>> {
        let t = self.tables.read().await;
        Ok(t.students.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn professor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Professor>> {
        let t = self.tables.read().await;
        Ok(t.professors.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>> {
        let t = self.tables.read().await;
        Ok(t.students.iter().filter(|s| ids.contains(&s.id)).cloned().collect())
    }

    async fn professors_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Professor>> {
        let t = self.tables.read().await;
        Ok(t.professors.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn list_students(&self) -> StoreResult<Vec<(Student, String)>> {
        let t = self.tables.read().await;
        let mut out: Vec<(Student, String)> = t
            .students
            .iter()
            .filter_map(|s| {
                t.users
                    .iter()
                    .find(|u| u.id == s.user_id)
                    .map(|u| (s.clone(), u.rfid.clone()))
            })
            .collect();
        out.sort_by(|a, b| a.0.full_name.cmp(&b.0.full_name));
        Ok(out)
    }

    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<Subject> {
        let mut t = self.tables.write().await;
        if !t.professors.iter().any(|p| p.id == subject.professor_id) {
            return Err(StoreError::NotFound("professor"));
        }
        let row = Subject {
            id: Uuid::new_v4(),
            professor_id: subject.professor_id,
            subject_name: subject.subject_name.clone(),
            subject_code: subject.subject_code.clone(),
            units: subject.units,
            start_time: subject.start_time,
            end_time: subject.end_time,
            days: subject.days.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.subjects.push(row.clone());
        Ok(row)
    }

    async fn update_subject(&self, subject: &Subject) -> StoreResult<Subject> {
        let mut t = self.tables.write().await;
        let slot = t
            .subjects
            .iter_mut()
            .find(|s| s.id == subject.id)
            .ok_or(StoreError::NotFound("subject"))?;
        slot.subject_name = subject.subject_name.clone();
        slot.subject_code = subject.subject_code.clone();
        slot.units = subject.units;
        slot.start_time = subject.start_time;
        slot.end_time = subject.end_time;
        slot.days = subject.days.clone();
        Ok(slot.clone())
    }

    async fn delete_subject(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.subjects.len();
        t.subjects.retain(|s| s.id != id);
        if t.subjects.len() == before {
            return Ok(false);
        }
        let gone: HashSet<Uuid> = t
            .enrollments
            .iter()
            .filter(|e| e.subject_id == id)
            .map(|e| e.id)
            .collect();
        t.drop_enrollments(&gone);
        Ok(true)
    }

    async fn get_subject(&self, id: Uuid) -> StoreResult<Option<Subject>> {
        let t = self.tables.read().await;
        Ok(t.subjects.iter().find(|s| s.id == id).cloned())
    }

    async fn subjects_by_professor(&self, professor_id: Uuid) -> StoreResult<Vec<Subject>> {
        let t = self.tables.read().await;
        Ok(t.subjects
            .iter()
            .filter(|s| s.professor_id == professor_id)
            .cloned()
            .collect())
    }

    async fn subjects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Subject>> {
        let t = self.tables.read().await;
        Ok(t.subjects.iter().filter(|s| ids.contains(&s.id)).cloned().collect())
    }

    async fn insert_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<Enrollment> {
        let mut t = self.tables.write().await;
        if !t.students.iter().any(|s| s.id == student_id) {
            return Err(StoreError::NotFound("student"));
        }
        if !t.subjects.iter().any(|s| s.id == subject_id) {
            return Err(StoreError::NotFound("subject"));
        }
        if t
            .enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.subject_id == subject_id)
        {
            return Err(StoreError::Conflict("enrollment already exists".into()));
        }
        let row = Enrollment {
            id: Uuid::new_v4(),
            student_id,
            subject_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.enrollments.push(row.clone());
        Ok(row)
    }

    async fn delete_enrollment(&self, student_id: Uuid, subject_id: Uuid) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let gone: HashSet<Uuid> = t
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.subject_id == subject_id)
            .map(|e| e.id)
            .collect();
        t.drop_enrollments(&gone);
        Ok(gone.len() as u64)
    }

    async fn enrollments_by_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let t = self.tables.read().await;
        Ok(t.enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn enrollments_by_subjects(&self, subject_ids: &[Uuid]) -> StoreResult<Vec<Enrollment>> {
        let t = self.tables.read().await;
        Ok(t.enrollments
            .iter()
            .filter(|e| subject_ids.contains(&e.subject_id))
            .cloned()
            .collect())
    }

    async fn insert_attendance_once(&self, row: &NewAttendance) -> StoreResult<Option<Attendance>> {
        // Check and insert under one write lock, like ON CONFLICT DO NOTHING.
        let mut t = self.tables.write().await;
        if !t.enrollments.iter().any(|e| e.id == row.enrollment_id) {
            return Err(StoreError::NotFound("enrollment"));
        }
        if t
            .attendance
            .iter()
            .any(|a| a.enrollment_id == row.enrollment_id && a.date == row.date)
        {
            return Ok(None);
        }
        let inserted = Attendance {
            id: Uuid::new_v4(),
            enrollment_id: row.enrollment_id,
            date: row.date,
            status: row.status,
            scanned_at: row.scanned_at,
            created_at: OffsetDateTime::now_utc(),
        };
        t.attendance.push(inserted.clone());
        Ok(Some(inserted))
    }

    async fn attendance_since(&self, enrollment_ids: &[Uuid], since: Date) -> StoreResult<Vec<Attendance>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Attendance> = t
            .attendance
            .iter()
            .filter(|a| enrollment_ids.contains(&a.enrollment_id) && a.date >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.scanned_at.cmp(&a.scanned_at)));
        Ok(rows)
    }

    async fn insert_grade(&self, grade: &NewGrade) -> StoreResult<Grade> {
        let mut t = self.tables.write().await;
        if !t.enrollments.iter().any(|e| e.id == grade.enrollment_id) {
            return Err(StoreError::NotFound("enrollment"));
        }
        let row = Grade {
            id: Uuid::new_v4(),
            enrollment_id: grade.enrollment_id,
            grade_type: grade.grade_type,
            title: grade.title.clone(),
            score: grade.score,
            max_score: grade.max_score,
            created_at: OffsetDateTime::now_utc(),
        };
        t.grades.push(row.clone());
        Ok(row)
    }

    async fn grades_by_enrollments(&self, enrollment_ids: &[Uuid]) -> StoreResult<Vec<Grade>> {
        let t = self.tables.read().await;
        Ok(t.grades
            .iter()
            .rev()
            .filter(|g| enrollment_ids.contains(&g.enrollment_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};
    use time::Weekday;

    use crate::store::AttendanceStatus;

    async fn seeded() -> (MemoryStore, Student, Subject) {
        let store = MemoryStore::new();
        let (_, prof) = store
            .create_professor(
                "P-1",
                &NewProfessor {
                    full_name: "Ada Reyes".into(),
                    staff_id: "S-9".into(),
                    academic_rank: "Instructor".into(),
                },
            )
            .await
            .unwrap();
        let (_, student) = store
            .create_student(
                "S-1",
                &NewStudent {
                    full_name: "Ben Cruz".into(),
                    student_number: "2024-001".into(),
                    year_section: "1-A".into(),
                    course: "BSCS".into(),
                },
            )
            .await
            .unwrap();
        let subject = store
            .insert_subject(&NewSubject {
                professor_id: prof.id,
                subject_name: "Algorithms".into(),
                subject_code: "CS301".into(),
                units: 3,
                start_time: time!(8:00),
                end_time: time!(9:00),
                days: vec![Weekday::Monday],
            })
            .await
            .unwrap();
        (store, student, subject)
    }

    #[tokio::test]
    async fn duplicate_rfid_is_a_conflict() {
        let (store, _, _) = seeded().await;
        let err = store
            .create_student(
                "S-1",
                &NewStudent {
                    full_name: "Other".into(),
                    student_number: "x".into(),
                    year_section: "x".into(),
                    course: "x".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_students().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attendance_insert_is_once_per_day() {
        let (store, student, subject) = seeded().await;
        let e = store.insert_enrollment(student.id, subject.id).await.unwrap();
        let row = NewAttendance {
            enrollment_id: e.id,
            date: date!(2024 - 03 - 04),
            status: AttendanceStatus::Present,
            scanned_at: datetime!(2024-03-04 8:05 UTC),
        };
        assert!(store.insert_attendance_once(&row).await.unwrap().is_some());
        assert!(store.insert_attendance_once(&row).await.unwrap().is_none());

        let next_day = NewAttendance { date: date!(2024 - 03 - 11), ..row };
        assert!(store.insert_attendance_once(&next_day).await.unwrap().is_some());
        let all = store.attendance_since(&[e.id], date!(2024 - 03 - 01)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, date!(2024 - 03 - 11));
    }

    #[tokio::test]
    async fn deleting_a_subject_cascades() {
        let (store, student, subject) = seeded().await;
        let e = store.insert_enrollment(student.id, subject.id).await.unwrap();
        store
            .insert_grade(&NewGrade {
                enrollment_id: e.id,
                grade_type: crate::store::GradeType::Quiz,
                title: "Quiz 1".into(),
                score: 8.0,
                max_score: 10.0,
            })
            .await
            .unwrap();
        assert!(store.delete_subject(subject.id).await.unwrap());
        assert!(store.enrollments_by_student(student.id).await.unwrap().is_empty());
        assert!(store.grades_by_enrollments(&[e.id]).await.unwrap().is_empty());
        assert!(!store.delete_subject(subject.id).await.unwrap());
    }
}
