//! crates/study_planner_core/src/reminders.rs
//!
//! Picks what a user should be reminded about. Delivering the reminder is
//! somebody else's job.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{StudySession, Subject};
use crate::scheduler::days_until_exam;

pub const DEFAULT_SESSION_LEAD_MINUTES: i64 = 30;
pub const DEFAULT_EXAM_WARNING_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct ExamWarning {
    pub subject: Subject,
    pub days_left: i64,
}

/// Incomplete sessions starting after `now` and no later than `now + lead`.
pub fn upcoming_sessions<'a>(
    sessions: &'a [StudySession],
    now: NaiveDateTime,
    lead: Duration,
) -> Vec<&'a StudySession> {
    sessions
        .iter()
        .filter(|s| !s.is_completed)
        .filter(|s| match s.start_time {
            Some(start) => {
                let starts_at = s.session_date.and_time(start);
                starts_at > now && starts_at - now <= lead
            }
            None => false,
        })
        .collect()
}

/// Subjects whose exam is between one and `horizon_days` days away, soonest first.
pub fn upcoming_exams(
    subjects: &[Subject],
    now: NaiveDateTime,
    horizon_days: i64,
) -> Vec<ExamWarning> {
    let mut warnings: Vec<ExamWarning> = subjects
        .iter()
        .filter_map(|subject| {
            let days_left = days_until_exam(now, subject.exam_date);
            (1..=horizon_days).contains(&days_left).then(|| ExamWarning {
                subject: subject.clone(),
                days_left,
            })
        })
        .collect();
    warnings.sort_by_key(|w| w.days_left);
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn session(day: u32, start: Option<(u32, u32)>, done: bool) -> StudySession {
        let now = Utc::now();
        StudySession {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            subject_id: Uuid::nil(),
            session_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            start_time: start.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            end_time: None,
            chapter_topic: String::new(),
            is_completed: done,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn subject(name: &str, exam_day: u32) -> Subject {
        let now = Utc::now();
        Subject {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            exam_date: NaiveDate::from_ymd_opt(2024, 6, exam_day).unwrap(),
            difficulty_level: 1,
            chapters_count: 1,
            study_days_per_week: 1,
            color: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sessions_within_lead_are_selected() {
        let sessions = vec![
            session(3, Some((18, 0)), false),
            session(3, Some((18, 20)), false),
            session(3, Some((18, 31)), false),
            session(3, Some((17, 40)), false),
            session(3, Some((18, 10)), true),
            session(3, None, false),
        ];
        let picked = upcoming_sessions(&sessions, at(3, 17, 50), Duration::minutes(30));

        let starts: Vec<_> = picked.iter().map(|s| s.start_time.unwrap()).collect();
        assert_eq!(
            starts,
            vec![
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 20, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn exams_inside_the_horizon_are_warned_soonest_first() {
        let subjects = vec![
            subject("Week", 10),
            subject("Tomorrow", 4),
            subject("Today", 3),
            subject("Far", 20),
        ];
        let warnings = upcoming_exams(&subjects, at(3, 12, 0), DEFAULT_EXAM_WARNING_DAYS);

        let names: Vec<(&str, i64)> = warnings
            .iter()
            .map(|w| (w.subject.name.as_str(), w.days_left))
            .collect();
        assert_eq!(names, vec![("Tomorrow", 1), ("Week", 7)]);
    }
}
