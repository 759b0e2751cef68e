//! crates/study_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Format used for every time the generator hands back ("HH:MM").
pub const SHORT_TIME_FORMAT: &str = "%H:%M";

/// Format used for times sent to storage ("HH:MM:SS").
pub const STORAGE_TIME_FORMAT: &str = "%H:%M:%S";

/// Most chapters a subject may have.
pub const MAX_CHAPTERS_COUNT: u32 = 1000;

/// Longest session or break, in minutes: one day.
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

/// Parses a wall-clock time given either as "HH:MM" or "HH:MM:SS".
pub fn parse_wall_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, STORAGE_TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, SHORT_TIME_FORMAT))
        .ok()
}

/// Weekday index of a date, Sunday = 0 through Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

//=========================================================================================
// Users
//=========================================================================================

// Owner of subjects, preferences and sessions. Identity itself is managed elsewhere.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Subjects
//=========================================================================================

/// A course with an exam deadline and a number of chapters to revise.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub exam_date: NaiveDate,
    /// Carried for future weighting; the generator does not read it.
    pub difficulty_level: u8,
    pub chapters_count: u32,
    pub study_days_per_week: u8,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to create a subject. Ids and timestamps come from the store.
#[derive(Debug, Clone)]
pub struct NewSubject {
    pub user_id: Uuid,
    pub name: String,
    pub exam_date: NaiveDate,
    pub difficulty_level: u8,
    pub chapters_count: u32,
    pub study_days_per_week: u8,
    pub color: String,
}

/// A partial update of a subject; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub difficulty_level: Option<u8>,
    pub chapters_count: Option<u32>,
    pub study_days_per_week: Option<u8>,
    pub color: Option<String>,
}

impl SubjectUpdate {
    pub fn apply_to(self, subject: &mut Subject) {
        if let Some(name) = self.name {
            subject.name = name;
        }
        if let Some(exam_date) = self.exam_date {
            subject.exam_date = exam_date;
        }
        if let Some(level) = self.difficulty_level {
            subject.difficulty_level = level;
        }
        if let Some(count) = self.chapters_count {
            subject.chapters_count = count;
        }
        if let Some(days) = self.study_days_per_week {
            subject.study_days_per_week = days;
        }
        if let Some(color) = self.color {
            subject.color = color;
        }
    }
}

//=========================================================================================
// Preferences
//=========================================================================================

/// A user's weekly availability and session timing.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPreferences {
    /// Weekday indices, Sunday = 0 through Saturday = 6.
    pub available_days: Vec<u8>,
    pub session_duration_minutes: u32,
    pub preferred_start_time: Option<NaiveTime>,
    /// Stored for the user; session end is always start + duration.
    pub preferred_end_time: Option<NaiveTime>,
    pub break_duration_minutes: u32,
}

impl UserPreferences {
    /// Returns true when sessions may be placed on `date`.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.available_days.contains(&weekday_index(date))
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            available_days: vec![1, 2, 3, 4, 5],
            session_duration_minutes: 60,
            preferred_start_time: NaiveTime::from_hms_opt(18, 0, 0),
            preferred_end_time: NaiveTime::from_hms_opt(22, 0, 0),
            break_duration_minutes: 15,
        }
    }
}

//=========================================================================================
// Generated schedule (not yet persisted)
//=========================================================================================

/// Start and end of a generated session on its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// One planned study block produced by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSession {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub session_date: NaiveDate,
    /// `None` when the user has no preferred start time.
    pub slot: Option<TimeSlot>,
    pub chapters: Vec<u32>,
    pub chapter_topic: String,
}

impl ScheduleSession {
    /// "HH:MM", or an empty string when no time was computed.
    pub fn start_time_label(&self) -> String {
        self.slot
            .map(|s| s.start.format(SHORT_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// "HH:MM", or an empty string when no time was computed.
    pub fn end_time_label(&self) -> String {
        self.slot
            .map(|s| s.end.format(SHORT_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Turns the planned session into a creation request for the store.
    pub fn to_new_session(&self, user_id: Uuid) -> NewStudySession {
        NewStudySession {
            user_id,
            subject_id: self.subject_id,
            session_date: self.session_date,
            start_time: self.slot.map(|s| s.start),
            end_time: self.slot.map(|s| s.end),
            chapter_topic: self.chapter_topic.clone(),
            is_completed: false,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub total_sessions: usize,
    /// Session count keyed by subject name.
    pub subjects_breakdown: BTreeMap<String, usize>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub schedule: Vec<ScheduleSession>,
    pub summary: ScheduleSummary,
}

//=========================================================================================
// Persisted study sessions
//=========================================================================================

/// A study session as it lives in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub chapter_topic: String,
    pub is_completed: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudySession {
    pub user_id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub chapter_topic: String,
    pub is_completed: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct StudySessionUpdate {
    pub session_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub chapter_topic: Option<String>,
    pub is_completed: Option<bool>,
    pub notes: Option<String>,
}

impl StudySessionUpdate {
    pub fn apply_to(self, session: &mut StudySession) {
        if let Some(date) = self.session_date {
            session.session_date = date;
        }
        if let Some(start) = self.start_time {
            session.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            session.end_time = Some(end);
        }
        if let Some(topic) = self.chapter_topic {
            session.chapter_topic = topic;
        }
        if let Some(done) = self.is_completed {
            session.is_completed = done;
        }
        if let Some(notes) = self.notes {
            session.notes = notes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_time_accepts_both_formats() {
        let expected = NaiveTime::from_hms_opt(18, 30, 0);
        assert_eq!(parse_wall_time("18:30"), expected);
        assert_eq!(parse_wall_time("18:30:00"), expected);
        assert_eq!(parse_wall_time("6pm"), None);
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        // 2024-06-02 was a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(weekday_index(sunday), 0);
        assert_eq!(weekday_index(sunday + chrono::Duration::days(6)), 6);
    }

    #[test]
    fn labels_are_empty_without_slot() {
        let session = ScheduleSession {
            subject_id: Uuid::new_v4(),
            subject_name: "Math".into(),
            session_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            slot: None,
            chapters: vec![1],
            chapter_topic: "Ôn tập Chương 1".into(),
        };
        assert_eq!(session.start_time_label(), "");
        assert_eq!(session.end_time_label(), "");

        let request = session.to_new_session(Uuid::nil());
        assert!(!request.is_completed);
        assert!(request.notes.is_empty());
        assert_eq!(request.start_time, None);
    }
}
