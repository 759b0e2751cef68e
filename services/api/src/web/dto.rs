//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API, and their conversion to and
//! from the core domain types. Dates travel as `YYYY-MM-DD`; generated plan
//! times as "HH:MM"; stored session times as "HH:MM:SS".

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use study_planner_core::domain::{
    parse_wall_time, NewSubject, ScheduleSession, ScheduleSummary, StudySession,
    StudySessionUpdate, Subject, SubjectUpdate, UserPreferences, MAX_CHAPTERS_COUNT,
    MAX_SESSION_MINUTES, SHORT_TIME_FORMAT, STORAGE_TIME_FORMAT,
};
use study_planner_core::reminders::ExamWarning;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

fn parse_time_field(field: &str, value: &str) -> Result<NaiveTime, String> {
    parse_wall_time(value).ok_or_else(|| format!("{} must be formatted as HH:MM", field))
}

fn parse_optional_time(field: &str, value: Option<&str>) -> Result<Option<NaiveTime>, String> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => parse_time_field(field, v).map(Some),
    }
}

fn check_chapters(count: u32) -> Result<(), String> {
    if !(1..=MAX_CHAPTERS_COUNT).contains(&count) {
        return Err(format!(
            "chapters_count must be between 1 and {}",
            MAX_CHAPTERS_COUNT
        ));
    }
    Ok(())
}

fn check_minutes(field: &str, minutes: u32, min: u32) -> Result<(), String> {
    if !(min..=MAX_SESSION_MINUTES).contains(&minutes) {
        return Err(format!(
            "{} must be between {} and {}",
            field, min, MAX_SESSION_MINUTES
        ));
    }
    Ok(())
}

fn check_study_days(days: u8) -> Result<(), String> {
    if !(1..=7).contains(&days) {
        return Err("study_days_per_week must be between 1 and 7".to_string());
    }
    Ok(())
}

fn check_difficulty(level: u8) -> Result<(), String> {
    if !(1..=5).contains(&level) {
        return Err("difficulty_level must be between 1 and 5".to_string());
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

//=========================================================================================
// Subjects
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub exam_date: NaiveDate,
    pub difficulty_level: u8,
    pub chapters_count: u32,
    pub study_days_per_week: u8,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subject> for SubjectResponse {
    fn from(s: Subject) -> Self {
        Self {
            id: s.id,
            name: s.name,
            exam_date: s.exam_date,
            difficulty_level: s.difficulty_level,
            chapters_count: s.chapters_count,
            study_days_per_week: s.study_days_per_week,
            color: s.color,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

fn default_difficulty() -> u8 {
    3
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub exam_date: NaiveDate,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: u8,
    pub chapters_count: u32,
    pub study_days_per_week: u8,
    #[serde(default = "default_color")]
    pub color: String,
}

impl CreateSubjectRequest {
    pub fn into_new_subject(self, user_id: Uuid) -> Result<NewSubject, String> {
        check_name(&self.name)?;
        check_chapters(self.chapters_count)?;
        check_study_days(self.study_days_per_week)?;
        check_difficulty(self.difficulty_level)?;
        Ok(NewSubject {
            user_id,
            name: self.name.trim().to_string(),
            exam_date: self.exam_date,
            difficulty_level: self.difficulty_level,
            chapters_count: self.chapters_count,
            study_days_per_week: self.study_days_per_week,
            color: self.color,
        })
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub difficulty_level: Option<u8>,
    pub chapters_count: Option<u32>,
    pub study_days_per_week: Option<u8>,
    pub color: Option<String>,
}

impl TryFrom<UpdateSubjectRequest> for SubjectUpdate {
    type Error = String;

    fn try_from(req: UpdateSubjectRequest) -> Result<Self, Self::Error> {
        if let Some(name) = &req.name {
            check_name(name)?;
        }
        if let Some(count) = req.chapters_count {
            check_chapters(count)?;
        }
        if let Some(days) = req.study_days_per_week {
            check_study_days(days)?;
        }
        if let Some(level) = req.difficulty_level {
            check_difficulty(level)?;
        }
        Ok(SubjectUpdate {
            name: req.name.map(|n| n.trim().to_string()),
            exam_date: req.exam_date,
            difficulty_level: req.difficulty_level,
            chapters_count: req.chapters_count,
            study_days_per_week: req.study_days_per_week,
            color: req.color,
        })
    }
}

//=========================================================================================
// Preferences
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PreferencesPayload {
    /// Weekday indices, 0 = Sunday through 6 = Saturday.
    pub available_days: Vec<u8>,
    pub session_duration_minutes: u32,
    /// "HH:MM"
    pub preferred_start_time: Option<String>,
    /// "HH:MM"
    pub preferred_end_time: Option<String>,
    #[serde(default)]
    pub break_duration_minutes: u32,
}

impl From<UserPreferences> for PreferencesPayload {
    fn from(p: UserPreferences) -> Self {
        Self {
            available_days: p.available_days,
            session_duration_minutes: p.session_duration_minutes,
            preferred_start_time: p
                .preferred_start_time
                .map(|t| t.format(SHORT_TIME_FORMAT).to_string()),
            preferred_end_time: p
                .preferred_end_time
                .map(|t| t.format(SHORT_TIME_FORMAT).to_string()),
            break_duration_minutes: p.break_duration_minutes,
        }
    }
}

impl TryFrom<PreferencesPayload> for UserPreferences {
    type Error = String;

    fn try_from(p: PreferencesPayload) -> Result<Self, Self::Error> {
        if let Some(day) = p.available_days.iter().find(|d| **d > 6) {
            return Err(format!("available_days contains {}, expected 0 to 6", day));
        }
        check_minutes("session_duration_minutes", p.session_duration_minutes, 1)?;
        check_minutes("break_duration_minutes", p.break_duration_minutes, 0)?;

        let mut available_days = p.available_days;
        available_days.sort_unstable();
        available_days.dedup();

        Ok(UserPreferences {
            available_days,
            session_duration_minutes: p.session_duration_minutes,
            preferred_start_time: parse_optional_time(
                "preferred_start_time",
                p.preferred_start_time.as_deref(),
            )?,
            preferred_end_time: parse_optional_time(
                "preferred_end_time",
                p.preferred_end_time.as_deref(),
            )?,
            break_duration_minutes: p.break_duration_minutes,
        })
    }
}

//=========================================================================================
// Stored study sessions
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StudySessionResponse {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    /// "HH:MM:SS"
    pub start_time: Option<String>,
    /// "HH:MM:SS"
    pub end_time: Option<String>,
    pub chapter_topic: String,
    pub is_completed: bool,
    pub notes: String,
}

impl From<StudySession> for StudySessionResponse {
    fn from(s: StudySession) -> Self {
        Self {
            id: s.id,
            subject_id: s.subject_id,
            session_date: s.session_date,
            start_time: s.start_time.map(|t| t.format(STORAGE_TIME_FORMAT).to_string()),
            end_time: s.end_time.map(|t| t.format(STORAGE_TIME_FORMAT).to_string()),
            chapter_topic: s.chapter_topic,
            is_completed: s.is_completed,
            notes: s.notes,
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateSessionRequest {
    pub session_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub chapter_topic: Option<String>,
    pub is_completed: Option<bool>,
    pub notes: Option<String>,
}

impl TryFrom<UpdateSessionRequest> for StudySessionUpdate {
    type Error = String;

    fn try_from(req: UpdateSessionRequest) -> Result<Self, Self::Error> {
        Ok(StudySessionUpdate {
            session_date: req.session_date,
            start_time: req
                .start_time
                .as_deref()
                .map(|v| parse_time_field("start_time", v))
                .transpose()?,
            end_time: req
                .end_time
                .as_deref()
                .map(|v| parse_time_field("end_time", v))
                .transpose()?,
            chapter_topic: req.chapter_topic,
            is_completed: req.is_completed,
            notes: req.notes,
        })
    }
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionRangeQuery {
    /// First date to include (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last date to include (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

//=========================================================================================
// Schedule generation
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GenerateScheduleRequest {
    pub subject_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ScheduleSessionResponse {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub session_date: NaiveDate,
    /// "HH:MM", empty when no preferred start time is set.
    pub start_time: String,
    /// "HH:MM", empty when no preferred start time is set.
    pub end_time: String,
    pub chapter_topic: String,
}

impl From<&ScheduleSession> for ScheduleSessionResponse {
    fn from(s: &ScheduleSession) -> Self {
        Self {
            subject_id: s.subject_id,
            subject_name: s.subject_name.clone(),
            session_date: s.session_date,
            start_time: s.start_time_label(),
            end_time: s.end_time_label(),
            chapter_topic: s.chapter_topic.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ScheduleSummaryResponse {
    pub total_sessions: usize,
    pub subjects_breakdown: BTreeMap<String, usize>,
    pub recommendations: Vec<String>,
}

impl From<ScheduleSummary> for ScheduleSummaryResponse {
    fn from(s: ScheduleSummary) -> Self {
        Self {
            total_sessions: s.total_sessions,
            subjects_breakdown: s.subjects_breakdown,
            recommendations: s.recommendations,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct GenerateScheduleResponse {
    pub schedule: Vec<ScheduleSessionResponse>,
    pub summary: ScheduleSummaryResponse,
    /// False when the plan was generated but could not be stored.
    pub saved: bool,
    pub message: String,
    /// The stored rows; empty when `saved` is false.
    pub sessions: Vec<StudySessionResponse>,
}

//=========================================================================================
// Reminders
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ExamWarningResponse {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub exam_date: NaiveDate,
    pub days_left: i64,
}

impl From<ExamWarning> for ExamWarningResponse {
    fn from(w: ExamWarning) -> Self {
        Self {
            subject_id: w.subject.id,
            subject_name: w.subject.name,
            exam_date: w.subject.exam_date,
            days_left: w.days_left,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct RemindersResponse {
    pub upcoming_sessions: Vec<StudySessionResponse>,
    pub upcoming_exams: Vec<ExamWarningResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_are_validated_and_normalised() {
        let payload = PreferencesPayload {
            available_days: vec![5, 1, 3, 1],
            session_duration_minutes: 50,
            preferred_start_time: Some("07:45".into()),
            preferred_end_time: Some(String::new()),
            break_duration_minutes: 5,
        };
        let prefs = UserPreferences::try_from(payload).unwrap();
        assert_eq!(prefs.available_days, vec![1, 3, 5]);
        assert_eq!(prefs.preferred_start_time, NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(prefs.preferred_end_time, None);

        let bad_day = PreferencesPayload {
            available_days: vec![7],
            session_duration_minutes: 50,
            preferred_start_time: None,
            preferred_end_time: None,
            break_duration_minutes: 0,
        };
        assert!(UserPreferences::try_from(bad_day).is_err());
    }

    #[test]
    fn preference_durations_are_bounded() {
        let payload = |duration: u32, pause: u32| PreferencesPayload {
            available_days: vec![1],
            session_duration_minutes: duration,
            preferred_start_time: Some("18:00".into()),
            preferred_end_time: None,
            break_duration_minutes: pause,
        };
        assert!(UserPreferences::try_from(payload(0, 0)).is_err());
        assert!(UserPreferences::try_from(payload(MAX_SESSION_MINUTES + 1, 0)).is_err());
        assert!(UserPreferences::try_from(payload(u32::MAX, 0)).is_err());
        assert!(UserPreferences::try_from(payload(60, u32::MAX)).is_err());
        let longest = payload(MAX_SESSION_MINUTES, MAX_SESSION_MINUTES);
        assert!(UserPreferences::try_from(longest).is_ok());
    }

    #[test]
    fn subject_requests_reject_out_of_range_values() {
        let request = CreateSubjectRequest {
            name: "Math".into(),
            exam_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            difficulty_level: 3,
            chapters_count: 0,
            study_days_per_week: 3,
            color: default_color(),
        };
        assert!(request.into_new_subject(Uuid::nil()).is_err());

        let update = UpdateSubjectRequest {
            study_days_per_week: Some(8),
            ..Default::default()
        };
        assert!(SubjectUpdate::try_from(update).is_err());
    }

    #[test]
    fn chapter_counts_are_capped() {
        let request = |chapters_count: u32| CreateSubjectRequest {
            name: "Math".into(),
            exam_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            difficulty_level: 3,
            chapters_count,
            study_days_per_week: 3,
            color: default_color(),
        };
        assert!(request(4_000_000_000).into_new_subject(Uuid::nil()).is_err());
        assert!(request(MAX_CHAPTERS_COUNT + 1).into_new_subject(Uuid::nil()).is_err());
        let accepted = request(MAX_CHAPTERS_COUNT).into_new_subject(Uuid::nil()).unwrap();
        assert_eq!(accepted.chapters_count, MAX_CHAPTERS_COUNT);

        let update = UpdateSubjectRequest {
            chapters_count: Some(u32::MAX),
            ..Default::default()
        };
        assert!(SubjectUpdate::try_from(update).is_err());
    }

    #[test]
    fn stored_times_render_with_seconds() {
        let now = Utc::now();
        let response = StudySessionResponse::from(StudySession {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            subject_id: Uuid::nil(),
            session_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0),
            end_time: NaiveTime::from_hms_opt(19, 0, 0),
            chapter_topic: String::new(),
            is_completed: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        });
        assert_eq!(response.start_time.as_deref(), Some("18:00:00"));
        assert_eq!(response.end_time.as_deref(), Some("19:00:00"));
    }
}
