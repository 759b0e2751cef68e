//! crates/study_planner_core/src/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. It keeps the
//! same ordering rules as the SQL adapter and is used by tests and by local
//! runs that do not have a database.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    NewStudySession, NewSubject, StudySession, StudySessionUpdate, Subject, SubjectUpdate, User,
    UserPreferences,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    subjects: Vec<Subject>,
    preferences: HashMap<Uuid, UserPreferences>,
    sessions: Vec<StudySession>,
}

#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
    fail_session_writes: Mutex<Option<String>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `create_study_sessions` call fail with `message`.
    pub fn fail_session_writes(&self, message: impl Into<String>) {
        if let Ok(mut slot) = self.fail_session_writes.lock() {
            *slot = Some(message.into());
        }
    }

    fn tables(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| PortError::Unexpected(format!("in-memory store poisoned: {e}")))
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        let mut tables = self.tables()?;
        let user = tables.users.entry(user_id).or_insert_with(|| User {
            user_id,
            created_at: Utc::now(),
        });
        Ok(user.clone())
    }

    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>> {
        let tables = self.tables()?;
        let mut subjects: Vec<Subject> = tables
            .subjects
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        subjects.sort_by_key(|s| (s.exam_date, s.created_at));
        Ok(subjects)
    }

    async fn get_subject(&self, subject_id: Uuid) -> PortResult<Subject> {
        self.tables()?
            .subjects
            .iter()
            .find(|s| s.id == subject_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Subject {} not found", subject_id)))
    }

    async fn create_subject(&self, subject: NewSubject) -> PortResult<Subject> {
        let now = Utc::now();
        let record = Subject {
            id: Uuid::new_v4(),
            user_id: subject.user_id,
            name: subject.name,
            exam_date: subject.exam_date,
            difficulty_level: subject.difficulty_level,
            chapters_count: subject.chapters_count,
            study_days_per_week: subject.study_days_per_week,
            color: subject.color,
            created_at: now,
            updated_at: now,
        };
        self.tables()?.subjects.push(record.clone());
        Ok(record)
    }

    async fn update_subject(&self, subject_id: Uuid, update: SubjectUpdate) -> PortResult<Subject> {
        let mut tables = self.tables()?;
        let subject = tables
            .subjects
            .iter_mut()
            .find(|s| s.id == subject_id)
            .ok_or_else(|| PortError::NotFound(format!("Subject {} not found", subject_id)))?;
        update.apply_to(subject);
        subject.updated_at = Utc::now();
        Ok(subject.clone())
    }

    async fn delete_subject(&self, subject_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        let before = tables.subjects.len();
        tables.subjects.retain(|s| s.id != subject_id);
        if tables.subjects.len() == before {
            return Err(PortError::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        Ok(self.tables()?.preferences.get(&user_id).cloned())
    }

    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: UserPreferences,
    ) -> PortResult<UserPreferences> {
        self.tables()?
            .preferences
            .insert(user_id, preferences.clone());
        Ok(preferences)
    }

    async fn list_study_sessions(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<StudySession>> {
        let tables = self.tables()?;
        let mut sessions: Vec<StudySession> = tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| from.map_or(true, |from| s.session_date >= from))
            .filter(|s| to.map_or(true, |to| s.session_date <= to))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.session_date, s.start_time));
        Ok(sessions)
    }

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.tables()?
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session_id)))
    }

    async fn create_study_sessions(
        &self,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>> {
        if let Some(message) = self
            .fail_session_writes
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .clone()
        {
            return Err(PortError::Unexpected(message));
        }

        let mut tables = self.tables()?;
        if let Some(orphan) = sessions
            .iter()
            .find(|s| !tables.subjects.iter().any(|subject| subject.id == s.subject_id))
        {
            return Err(PortError::Invalid(format!(
                "Subject {} does not exist",
                orphan.subject_id
            )));
        }

        let now = Utc::now();
        let created: Vec<StudySession> = sessions
            .into_iter()
            .map(|s| StudySession {
                id: Uuid::new_v4(),
                user_id: s.user_id,
                subject_id: s.subject_id,
                session_date: s.session_date,
                start_time: s.start_time,
                end_time: s.end_time,
                chapter_topic: s.chapter_topic,
                is_completed: s.is_completed,
                notes: s.notes,
                created_at: now,
                updated_at: now,
            })
            .collect();
        tables.sessions.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_study_session(
        &self,
        session_id: Uuid,
        update: StudySessionUpdate,
    ) -> PortResult<StudySession> {
        let mut tables = self.tables()?;
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session_id)))?;
        update.apply_to(session);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn delete_study_session(&self, session_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.id != session_id);
        if tables.sessions.len() == before {
            return Err(PortError::NotFound(format!("Study session {} not found", session_id)));
        }
        Ok(())
    }

    async fn delete_sessions_for_subject(&self, subject_id: Uuid) -> PortResult<()> {
        self.tables()?.sessions.retain(|s| s.subject_id != subject_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_subject(user_id: Uuid, name: &str, exam: NaiveDate) -> NewSubject {
        NewSubject {
            user_id,
            name: name.to_string(),
            exam_date: exam,
            difficulty_level: 2,
            chapters_count: 4,
            study_days_per_week: 3,
            color: "#10b981".to_string(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn session(user_id: Uuid, subject_id: Uuid, day: u32) -> NewStudySession {
        NewStudySession {
            user_id,
            subject_id,
            session_date: date(day),
            start_time: None,
            end_time: None,
            chapter_topic: "Ôn tập Chương 1".to_string(),
            is_completed: false,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn subjects_are_listed_per_user_by_exam_date() {
        let db = InMemoryDatabase::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        db.create_subject(new_subject(alice, "Later", date(28))).await.unwrap();
        db.create_subject(new_subject(alice, "Sooner", date(14))).await.unwrap();
        db.create_subject(new_subject(bob, "Other", date(1))).await.unwrap();

        let names: Vec<String> = db
            .list_subjects(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Sooner", "Later"]);
    }

    #[tokio::test]
    async fn sessions_filter_by_inclusive_range_and_cascade_by_subject() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let subject = db.create_subject(new_subject(user, "Math", date(28))).await.unwrap();

        db.create_study_sessions(vec![
            session(user, subject.id, 12),
            session(user, subject.id, 3),
            session(user, subject.id, 7),
        ])
        .await
        .unwrap();

        let ranged = db
            .list_study_sessions(user, Some(date(3)), Some(date(7)))
            .await
            .unwrap();
        let days: Vec<NaiveDate> = ranged.iter().map(|s| s.session_date).collect();
        assert_eq!(days, vec![date(3), date(7)]);

        db.delete_sessions_for_subject(subject.id).await.unwrap();
        assert!(db.list_study_sessions(user, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orphan_sessions_are_rejected() {
        let db = InMemoryDatabase::new();
        let result = db
            .create_study_sessions(vec![session(Uuid::new_v4(), Uuid::new_v4(), 3)])
            .await;
        assert!(matches!(result, Err(PortError::Invalid(_))));
    }

    #[tokio::test]
    async fn updates_patch_only_given_fields() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let subject = db.create_subject(new_subject(user, "Math", date(28))).await.unwrap();
        let created = db
            .create_study_sessions(vec![session(user, subject.id, 3)])
            .await
            .unwrap();

        let updated = db
            .update_study_session(
                created[0].id,
                StudySessionUpdate {
                    is_completed: Some(true),
                    notes: Some("done".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_completed);
        assert_eq!(updated.notes, "done");
        assert_eq!(updated.chapter_topic, "Ôn tập Chương 1");

        let missing = db.delete_study_session(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(PortError::NotFound(_))));
    }
}
