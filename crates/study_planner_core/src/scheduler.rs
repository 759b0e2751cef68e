//! crates/study_planner_core/src/scheduler.rs
//!
//! The schedule generator. Given subjects and a user's preferences it places
//! study sessions on eligible dates before each exam and splits every
//! subject's chapters across those sessions.
//!
//! The generator is pure: "now" and the random source are parameters, so a
//! fixed clock and a seeded RNG reproduce a plan exactly.

use crate::clock::Clock;
use crate::domain::{
    ScheduleResult, ScheduleSession, ScheduleSummary, Subject, TimeSlot, UserPreferences,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Label prefix of every generated chapter topic.
pub const REVIEW_TOPIC_PREFIX: &str = "Ôn tập Chương";

/// The single recommendation attached to every summary.
pub const DEFAULT_RECOMMENDATION: &str = "Ôn tập đều đặn mỗi ngày để đạt hiệu quả tốt nhất.";

/// A chapter is never spread over more than this many sessions.
const MAX_SESSIONS_PER_CHAPTER: usize = 2;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

//=========================================================================================
// Stage 1: remaining days
//=========================================================================================

/// Whole days from `now` to the start of the exam day, rounded up.
///
/// Zero or negative once the exam day has begun.
pub fn days_until_exam(now: NaiveDateTime, exam_date: NaiveDate) -> i64 {
    let millis = (exam_date.and_time(NaiveTime::MIN) - now).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// Weeks left before the exam, rounded up. Never negative.
pub fn weeks_until_exam(days_until_exam: i64) -> i64 {
    (days_until_exam.max(0) + 6) / 7
}

//=========================================================================================
// Stage 2: eligible dates
//=========================================================================================

fn eligible_days<'a>(
    today: NaiveDate,
    exam_date: NaiveDate,
    preferences: &'a UserPreferences,
) -> impl Iterator<Item = NaiveDate> + 'a {
    today
        .iter_days()
        .take_while(move |day| *day < exam_date)
        .filter(move |day| preferences.is_available(*day))
}

/// Every date in `[today, exam_date)` that falls on an available weekday, in calendar order.
pub fn eligible_dates(
    today: NaiveDate,
    exam_date: NaiveDate,
    preferences: &UserPreferences,
) -> Vec<NaiveDate> {
    eligible_days(today, exam_date, preferences).collect()
}

/// Number of dates `eligible_dates` would return.
pub fn count_available_days(
    today: NaiveDate,
    exam_date: NaiveDate,
    preferences: &UserPreferences,
) -> usize {
    eligible_days(today, exam_date, preferences).count()
}

//=========================================================================================
// Stage 3: session count
//=========================================================================================

/// The three independent upper bounds on how many sessions a subject receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCap {
    /// One session per eligible date at most.
    pub by_availability: usize,
    /// Weeks left times the subject's weekly study days.
    pub by_frequency: usize,
    /// Two sessions per chapter at most.
    pub by_chapters: usize,
}

impl SessionCap {
    pub fn derive(subject: &Subject, available_days: usize, days_until_exam: i64) -> Self {
        let weeks = weeks_until_exam(days_until_exam);
        let by_frequency = usize::try_from(weeks * i64::from(subject.study_days_per_week))
            .unwrap_or(0);

        Self {
            by_availability: available_days,
            by_frequency,
            by_chapters: subject.chapters_count as usize * MAX_SESSIONS_PER_CHAPTER,
        }
    }

    pub fn limit(&self) -> usize {
        self.by_availability
            .min(self.by_frequency)
            .min(self.by_chapters)
    }
}

//=========================================================================================
// Stage 4: chapter partitioning
//=========================================================================================

/// Splits chapters `1..=chapters_count` over at most `slots` sessions.
///
/// Each session takes `ceil(chapters_count / slots)` chapters in ascending
/// order. When the grouping runs out of chapters before the last slot, the
/// remaining slots get nothing and are left out of the result, so the output
/// may be shorter than `slots`. Every chapter appears exactly once.
pub fn partition_chapters(chapters_count: u32, slots: usize) -> Vec<Vec<u32>> {
    if chapters_count == 0 || slots == 0 {
        return Vec::new();
    }

    let chapters: Vec<u32> = (1..=chapters_count).collect();
    let per_session = chapters.len().div_ceil(slots);

    chapters
        .chunks(per_session)
        .take(slots)
        .map(<[u32]>::to_vec)
        .collect()
}

//=========================================================================================
// Session details
//=========================================================================================

/// Start at the preferred time, end `session_duration_minutes` later.
///
/// An end past midnight wraps to the next day's clock time.
pub fn session_slot(date: NaiveDate, preferences: &UserPreferences) -> Option<TimeSlot> {
    preferences.preferred_start_time.map(|start| {
        let begin = date.and_time(start);
        let end = begin + Duration::minutes(i64::from(preferences.session_duration_minutes));
        TimeSlot {
            start: begin.time(),
            end: end.time(),
        }
    })
}

/// "Ôn tập Chương 1, 2, 3"
pub fn chapter_topic(chapters: &[u32]) -> String {
    let numbers = chapters
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{REVIEW_TOPIC_PREFIX} {numbers}")
}

//=========================================================================================
// Generation
//=========================================================================================

/// Plans the sessions of a single subject.
///
/// Returns an empty list when the subject has no eligible date or its cap is zero.
pub fn schedule_subject<R: Rng + ?Sized>(
    subject: &Subject,
    preferences: &UserPreferences,
    now: NaiveDateTime,
    rng: &mut R,
) -> Vec<ScheduleSession> {
    let today = now.date();
    let days_left = days_until_exam(now, subject.exam_date);
    let available = count_available_days(today, subject.exam_date, preferences);
    let cap = SessionCap::derive(subject, available, days_left);

    let mut dates = eligible_dates(today, subject.exam_date, preferences);
    let sessions_count = cap.limit().min(dates.len());

    debug!(
        subject = %subject.name,
        days_left,
        ?cap,
        sessions_count,
        "derived session count"
    );

    if sessions_count == 0 {
        debug!(subject = %subject.name, "no sessions can be placed, skipping");
        return Vec::new();
    }

    dates.shuffle(rng);

    dates
        .into_iter()
        .take(sessions_count)
        .zip(partition_chapters(subject.chapters_count, sessions_count))
        .map(|(date, chapters)| ScheduleSession {
            subject_id: subject.id,
            subject_name: subject.name.clone(),
            session_date: date,
            slot: session_slot(date, preferences),
            chapter_topic: chapter_topic(&chapters),
            chapters,
        })
        .collect()
}

/// Plans every subject in input order and summarises the result.
pub fn generate_schedule<R: Rng + ?Sized>(
    subjects: &[Subject],
    preferences: &UserPreferences,
    now: NaiveDateTime,
    rng: &mut R,
) -> ScheduleResult {
    let schedule: Vec<ScheduleSession> = subjects
        .iter()
        .flat_map(|subject| schedule_subject(subject, preferences, now, &mut *rng))
        .collect();
    let summary = summarize(subjects, &schedule);

    ScheduleResult { schedule, summary }
}

/// Counts sessions per subject name. Subjects without sessions are listed with zero.
pub fn summarize(subjects: &[Subject], schedule: &[ScheduleSession]) -> ScheduleSummary {
    let subjects_breakdown: BTreeMap<String, usize> = subjects
        .iter()
        .map(|subject| {
            let count = schedule
                .iter()
                .filter(|session| session.subject_id == subject.id)
                .count();
            (subject.name.clone(), count)
        })
        .collect();

    ScheduleSummary {
        total_sessions: schedule.len(),
        subjects_breakdown,
        recommendations: vec![DEFAULT_RECOMMENDATION.to_string()],
    }
}

//=========================================================================================
// Generator with injected clock and seed
//=========================================================================================

/// Bundles a clock and an optional seed for callers that generate repeatedly.
///
/// With a seed every call shuffles identically; without one each call draws fresh entropy.
#[derive(Clone)]
pub struct ScheduleGenerator {
    clock: Arc<dyn Clock>,
    seed: Option<u64>,
}

impl ScheduleGenerator {
    pub fn new(clock: Arc<dyn Clock>, seed: Option<u64>) -> Self {
        Self { clock, seed }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// A fresh random source for one generation run.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn generate(&self, subjects: &[Subject], preferences: &UserPreferences) -> ScheduleResult {
        generate_schedule(subjects, preferences, self.now(), &mut self.rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::parse_wall_time;
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    // Monday, 08:00.
    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn subject(name: &str, chapters: u32, per_week: u8, exam_in_days: i64) -> Subject {
        let now = Utc::now();
        Subject {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            exam_date: monday_morning().date() + Duration::days(exam_in_days),
            difficulty_level: 3,
            chapters_count: chapters,
            study_days_per_week: per_week,
            color: "#3b82f6".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn mon_wed_fri() -> UserPreferences {
        UserPreferences {
            available_days: vec![1, 3, 5],
            session_duration_minutes: 60,
            preferred_start_time: NaiveTime::from_hms_opt(18, 0, 0),
            preferred_end_time: None,
            break_duration_minutes: 0,
        }
    }

    #[test]
    fn days_until_exam_rounds_up_partial_days() {
        let now = monday_morning();
        let exam = now.date() + Duration::days(14);
        assert_eq!(days_until_exam(now, exam), 14);
        assert_eq!(days_until_exam(now.date().and_time(NaiveTime::MIN), exam), 14);
        assert_eq!(days_until_exam(now, now.date()), 0);
        assert_eq!(days_until_exam(now, now.date() - Duration::days(3)), -3);
    }

    #[test]
    fn weeks_until_exam_clamps_and_rounds_up() {
        assert_eq!(weeks_until_exam(14), 2);
        assert_eq!(weeks_until_exam(15), 3);
        assert_eq!(weeks_until_exam(1), 1);
        assert_eq!(weeks_until_exam(0), 0);
        assert_eq!(weeks_until_exam(-10), 0);
    }

    #[test]
    fn eligible_dates_excludes_exam_day_and_unavailable_weekdays() {
        let today = monday_morning().date();
        let exam = today + Duration::days(14);
        let dates = eligible_dates(today, exam, &mon_wed_fri());

        let days: Vec<u32> = dates.iter().map(|d| chrono::Datelike::day(d)).collect();
        assert_eq!(days, vec![3, 5, 7, 10, 12, 14]);
        assert_eq!(count_available_days(today, exam, &mon_wed_fri()), dates.len());
        // The exam itself is a Monday and must not be offered.
        assert!(!dates.contains(&exam));
    }

    #[test]
    fn worked_example_two_weeks_mon_wed_fri() {
        let math = subject("Math", 10, 3, 14);
        let prefs = mon_wed_fri();
        let now = monday_morning();

        let available = count_available_days(now.date(), math.exam_date, &prefs);
        let cap = SessionCap::derive(&math, available, days_until_exam(now, math.exam_date));
        assert_eq!(cap.by_frequency, 6);
        assert_eq!(cap.by_chapters, 20);
        assert_eq!(cap.by_availability, 6);
        assert_eq!(cap.limit(), 6);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sessions = schedule_subject(&math, &prefs, now, &mut rng);

        // Two chapters per slot means the sixth slot has nothing left to cover.
        assert_eq!(sessions.len(), 5);
        for session in &sessions {
            assert_eq!(session.chapters.len(), 2);
            assert_eq!(session.start_time_label(), "18:00");
            assert_eq!(session.end_time_label(), "19:00");
        }
        assert_eq!(sessions[0].chapter_topic, "Ôn tập Chương 1, 2");
        assert_eq!(sessions[4].chapter_topic, "Ôn tập Chương 9, 10");
    }

    #[test]
    fn partition_covers_every_chapter_once() {
        for chapters in 1..=25u32 {
            for slots in 1..=30usize {
                let groups = partition_chapters(chapters, slots);
                assert!(groups.len() <= slots);
                let flat: Vec<u32> = groups.into_iter().flatten().collect();
                assert_eq!(flat, (1..=chapters).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn partition_drops_starved_slots() {
        // ceil(7 / 3) = 3 -> [1,2,3] [4,5,6] [7]
        assert_eq!(partition_chapters(7, 3), vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
        // ceil(5 / 4) = 2 -> the fourth slot is starved
        assert_eq!(partition_chapters(5, 4), vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert!(partition_chapters(5, 0).is_empty());
        assert!(partition_chapters(0, 3).is_empty());
    }

    #[test]
    fn generated_sessions_respect_window_weekday_and_caps() {
        let prefs = UserPreferences {
            available_days: vec![0, 2, 4, 6],
            ..mon_wed_fri()
        };
        let now = monday_morning();
        let subjects = vec![
            subject("Physics", 4, 2, 30),
            subject("History", 12, 5, 9),
            subject("Chemistry", 1, 7, 60),
            subject("Biology", 30, 1, 21),
        ];

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = generate_schedule(&subjects, &prefs, now, &mut rng);

            for subject in &subjects {
                let own: Vec<_> = result
                    .schedule
                    .iter()
                    .filter(|s| s.subject_id == subject.id)
                    .collect();

                let cap = SessionCap::derive(
                    subject,
                    count_available_days(now.date(), subject.exam_date, &prefs),
                    days_until_exam(now, subject.exam_date),
                );
                assert!(own.len() <= cap.limit());

                let mut seen = HashSet::new();
                for session in &own {
                    assert!(session.session_date >= now.date());
                    assert!(session.session_date < subject.exam_date);
                    assert!(prefs.is_available(session.session_date));
                    assert!(seen.insert(session.session_date), "duplicate date");
                }

                let mut chapters: Vec<u32> =
                    own.iter().flat_map(|s| s.chapters.iter().copied()).collect();
                chapters.sort_unstable();
                assert_eq!(chapters, (1..=subject.chapters_count).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn exam_today_or_past_yields_nothing() {
        let prefs = UserPreferences {
            available_days: (0..7).collect(),
            ..mon_wed_fri()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let now = monday_morning();

        assert!(schedule_subject(&subject("Today", 5, 3, 0), &prefs, now, &mut rng).is_empty());
        assert!(schedule_subject(&subject("Past", 5, 3, -4), &prefs, now, &mut rng).is_empty());
    }

    #[test]
    fn no_available_days_yields_nothing() {
        let prefs = UserPreferences {
            available_days: Vec::new(),
            ..mon_wed_fri()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let art = subject("Art", 5, 3, 40);
        let result = generate_schedule(&[art], &prefs, monday_morning(), &mut rng);

        assert!(result.schedule.is_empty());
        assert_eq!(result.summary.total_sessions, 0);
        assert_eq!(result.summary.subjects_breakdown.get("Art"), Some(&0));
    }

    #[test]
    fn exam_tomorrow_allows_a_session_today() {
        let prefs = UserPreferences {
            available_days: (0..7).collect(),
            ..mon_wed_fri()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let now = monday_morning();
        let sessions = schedule_subject(&subject("Quiz", 3, 2, 1), &prefs, now, &mut rng);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_date, now.date());
        assert_eq!(sessions[0].chapters, vec![1, 2, 3]);
    }

    #[test]
    fn missing_start_time_leaves_times_empty() {
        let prefs = UserPreferences {
            preferred_start_time: None,
            ..mon_wed_fri()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let music = subject("Music", 2, 3, 14);
        let sessions = schedule_subject(&music, &prefs, monday_morning(), &mut rng);

        assert!(!sessions.is_empty());
        assert!(sessions.iter().all(|s| s.slot.is_none() && s.start_time_label().is_empty()));
    }

    #[test]
    fn slot_wraps_past_midnight_and_formats_stably() {
        let prefs = UserPreferences {
            preferred_start_time: NaiveTime::from_hms_opt(23, 30, 0),
            session_duration_minutes: 90,
            ..mon_wed_fri()
        };
        let slot = session_slot(monday_morning().date(), &prefs).unwrap();
        assert_eq!(slot.start, NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        assert_eq!(slot.end, NaiveTime::from_hms_opt(1, 0, 0).unwrap());

        let generator = ScheduleGenerator::new(Arc::new(FixedClock(monday_morning())), Some(9));
        let subjects = vec![subject("Night", 4, 3, 14)];
        let first = generator.generate(&subjects, &prefs);
        let second = generator.generate(&subjects, &prefs);
        assert!(!first.schedule.is_empty());

        for (a, b) in first.schedule.iter().zip(&second.schedule) {
            assert_eq!(a.start_time_label(), "23:30");
            assert_eq!(a.end_time_label(), "01:00");
            assert_eq!(a.start_time_label(), b.start_time_label());
            assert_eq!(a.end_time_label(), b.end_time_label());

            // Labels parse back to the same clock time and print identically.
            for label in [a.start_time_label(), a.end_time_label()] {
                let parsed = parse_wall_time(&label).unwrap();
                assert_eq!(parsed.format(crate::domain::SHORT_TIME_FORMAT).to_string(), label);
            }
        }
    }

    #[test]
    fn summary_counts_by_subject_name() {
        let prefs = mon_wed_fri();
        let subjects = vec![subject("Math", 10, 3, 14), subject("Late", 4, 2, 0)];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let result = generate_schedule(&subjects, &prefs, monday_morning(), &mut rng);

        assert_eq!(result.summary.total_sessions, result.schedule.len());
        assert_eq!(result.summary.subjects_breakdown["Math"], 5);
        assert_eq!(result.summary.subjects_breakdown["Late"], 0);
        assert_eq!(result.summary.recommendations, vec![DEFAULT_RECOMMENDATION.to_string()]);
        // Output keeps subject input order.
        assert!(result.schedule.iter().all(|s| s.subject_name == "Math"));
    }

    #[test]
    fn seeded_generator_is_reproducible() {
        let clock = Arc::new(FixedClock(monday_morning()));
        let generator = ScheduleGenerator::new(clock, Some(42));
        let subjects = vec![subject("Math", 10, 3, 28), subject("Physics", 6, 2, 35)];
        let prefs = mon_wed_fri();

        let first = generator.generate(&subjects, &prefs);
        let second = generator.generate(&subjects, &prefs);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_shuffle_dates_differently() {
        let subjects = vec![subject("Math", 10, 3, 28)];
        let prefs = mon_wed_fri();
        let now = monday_morning();

        let orders: HashSet<Vec<NaiveDate>> = (0..20)
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                generate_schedule(&subjects, &prefs, now, &mut rng)
                    .schedule
                    .iter()
                    .map(|s| s.session_date)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }
}
