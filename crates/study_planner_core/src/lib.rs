pub mod clock;
pub mod domain;
pub mod memory;
pub mod planner;
pub mod ports;
pub mod reminders;
pub mod scheduler;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    NewStudySession, NewSubject, ScheduleResult, ScheduleSession, ScheduleSummary, StudySession,
    StudySessionUpdate, Subject, SubjectUpdate, TimeSlot, User, UserPreferences,
};
pub use memory::InMemoryDatabase;
pub use planner::{generate_plan, remove_subject, PlanError, PlanOutcome};
pub use ports::{DatabaseService, PortError, PortResult};
pub use scheduler::{generate_schedule, ScheduleGenerator};
