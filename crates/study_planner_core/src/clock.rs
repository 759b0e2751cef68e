//! crates/study_planner_core/src/clock.rs
//!
//! The current wall-clock time as an injected dependency, so the scheduler and
//! reminder selection never read a hidden global "now".

use chrono::{Local, NaiveDateTime};

pub trait Clock: Send + Sync {
    /// The current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the machine's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always answers the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
