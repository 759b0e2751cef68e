//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use study_planner_core::domain::{
    NewStudySession, NewSubject, StudySession, StudySessionUpdate, Subject, SubjectUpdate, User,
    UserPreferences,
};
use study_planner_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const SUBJECT_COLUMNS: &str = "id, user_id, name, exam_date, difficulty_level, chapters_count, \
     study_days_per_week, color, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, subject_id, session_date, start_time, end_time, \
     chapter_topic, is_completed, notes, created_at, updated_at";

const PREFERENCE_COLUMNS: &str = "available_days, session_duration_minutes, \
     preferred_start_time, preferred_end_time, break_duration_minutes";

fn not_found_or_unexpected(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            PortError::Invalid(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Column values are `INTEGER`; anything past `i32::MAX` is refused before it reaches SQL.
fn to_db_int(field: &str, value: u32) -> PortResult<i32> {
    i32::try_from(value)
        .map_err(|_| PortError::Invalid(format!("{} {} is out of range", field, value)))
}

fn unexpected(e: sqlx::Error) -> PortError {
    not_found_or_unexpected(e, || "Row not found".to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SubjectRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    exam_date: NaiveDate,
    difficulty_level: i16,
    chapters_count: i32,
    study_days_per_week: i16,
    color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SubjectRecord {
    fn to_domain(self) -> Subject {
        Subject {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            exam_date: self.exam_date,
            difficulty_level: self.difficulty_level as u8,
            chapters_count: self.chapters_count as u32,
            study_days_per_week: self.study_days_per_week as u8,
            color: self.color,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PreferencesRecord {
    available_days: Vec<i16>,
    session_duration_minutes: i32,
    preferred_start_time: Option<NaiveTime>,
    preferred_end_time: Option<NaiveTime>,
    break_duration_minutes: i32,
}
impl PreferencesRecord {
    fn to_domain(self) -> UserPreferences {
        UserPreferences {
            available_days: self
                .available_days
                .into_iter()
                .filter_map(|d| u8::try_from(d).ok())
                .collect(),
            session_duration_minutes: self.session_duration_minutes as u32,
            preferred_start_time: self.preferred_start_time,
            preferred_end_time: self.preferred_end_time,
            break_duration_minutes: self.break_duration_minutes as u32,
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    subject_id: Uuid,
    session_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    chapter_topic: String,
    is_completed: bool,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            session_date: self.session_date,
            start_time: self.start_time,
            end_time: self.end_time,
            chapter_topic: self.chapter_topic,
            is_completed: self.is_completed,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("User {} not found", user_id)))?;

        Ok(record.to_domain())
    }

    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>> {
        let records = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE user_id = $1 \
             ORDER BY exam_date ASC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_subject(&self, subject_id: Uuid) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"
        ))
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("Subject {} not found", subject_id)))?;
        Ok(record.to_domain())
    }

    async fn create_subject(&self, subject: NewSubject) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "INSERT INTO subjects (id, user_id, name, exam_date, difficulty_level, chapters_count, \
             study_days_per_week, color) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(subject.user_id)
        .bind(subject.name)
        .bind(subject.exam_date)
        .bind(i16::from(subject.difficulty_level))
        .bind(to_db_int("chapters_count", subject.chapters_count)?)
        .bind(i16::from(subject.study_days_per_week))
        .bind(subject.color)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_subject(&self, subject_id: Uuid, update: SubjectUpdate) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "UPDATE subjects SET \
               name = COALESCE($2, name), \
               exam_date = COALESCE($3, exam_date), \
               difficulty_level = COALESCE($4, difficulty_level), \
               chapters_count = COALESCE($5, chapters_count), \
               study_days_per_week = COALESCE($6, study_days_per_week), \
               color = COALESCE($7, color), \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(subject_id)
        .bind(update.name)
        .bind(update.exam_date)
        .bind(update.difficulty_level.map(i16::from))
        .bind(
            update
                .chapters_count
                .map(|c| to_db_int("chapters_count", c))
                .transpose()?,
        )
        .bind(update.study_days_per_week.map(i16::from))
        .bind(update.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, || format!("Subject {} not found", subject_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_subject(&self, subject_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Subject {} not found", subject_id)));
        }
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>> {
        let record = sqlx::query_as::<_, PreferencesRecord>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: UserPreferences,
    ) -> PortResult<UserPreferences> {
        let days: Vec<i16> = preferences.available_days.iter().map(|d| i16::from(*d)).collect();
        let record = sqlx::query_as::<_, PreferencesRecord>(&format!(
            "INSERT INTO user_preferences (user_id, available_days, session_duration_minutes, \
               preferred_start_time, preferred_end_time, break_duration_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET \
               available_days = EXCLUDED.available_days, \
               session_duration_minutes = EXCLUDED.session_duration_minutes, \
               preferred_start_time = EXCLUDED.preferred_start_time, \
               preferred_end_time = EXCLUDED.preferred_end_time, \
               break_duration_minutes = EXCLUDED.break_duration_minutes, \
               updated_at = NOW() \
             RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(days)
        .bind(to_db_int(
            "session_duration_minutes",
            preferences.session_duration_minutes,
        )?)
        .bind(preferences.preferred_start_time)
        .bind(preferences.preferred_end_time)
        .bind(to_db_int(
            "break_duration_minutes",
            preferences.break_duration_minutes,
        )?)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_study_sessions(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions \
             WHERE user_id = $1 \
               AND ($2::date IS NULL OR session_date >= $2) \
               AND ($3::date IS NULL OR session_date <= $3) \
             ORDER BY session_date ASC, start_time ASC NULLS LAST"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, || format!("Study session {} not found", session_id))
        })?;
        Ok(record.to_domain())
    }

    async fn create_study_sessions(
        &self,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>> {
        // All rows go in together or not at all.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let insert = format!(
            "INSERT INTO study_sessions (id, user_id, subject_id, session_date, start_time, \
               end_time, chapter_topic, is_completed, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {SESSION_COLUMNS}"
        );

        let mut created = Vec::with_capacity(sessions.len());
        for session in sessions {
            let record = sqlx::query_as::<_, StudySessionRecord>(&insert)
                .bind(Uuid::new_v4())
                .bind(session.user_id)
                .bind(session.subject_id)
                .bind(session.session_date)
                .bind(session.start_time)
                .bind(session.end_time)
                .bind(session.chapter_topic)
                .bind(session.is_completed)
                .bind(session.notes)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
            created.push(record.to_domain());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(created)
    }

    async fn update_study_session(
        &self,
        session_id: Uuid,
        update: StudySessionUpdate,
    ) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "UPDATE study_sessions SET \
               session_date = COALESCE($2, session_date), \
               start_time = COALESCE($3, start_time), \
               end_time = COALESCE($4, end_time), \
               chapter_topic = COALESCE($5, chapter_topic), \
               is_completed = COALESCE($6, is_completed), \
               notes = COALESCE($7, notes), \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(session_id)
        .bind(update.session_date)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(update.chapter_topic)
        .bind(update.is_completed)
        .bind(update.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, || format!("Study session {} not found", session_id))
        })?;
        Ok(record.to_domain())
    }

    async fn delete_study_session(&self, session_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Study session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn delete_sessions_for_subject(&self, subject_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM study_sessions WHERE subject_id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_columns_refuse_values_past_i32() {
        assert_eq!(to_db_int("chapters_count", 12).unwrap(), 12);
        assert_eq!(to_db_int("chapters_count", i32::MAX as u32).unwrap(), i32::MAX);
        assert!(matches!(
            to_db_int("chapters_count", 4_000_000_000),
            Err(PortError::Invalid(_))
        ));
    }
}
