//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use study_planner_core::clock::Clock;
use study_planner_core::ports::DatabaseService;
use study_planner_core::scheduler::ScheduleGenerator;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub generator: ScheduleGenerator,
}

impl AppState {
    /// Wires the generator to the same clock the reminder queries use.
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        let generator = ScheduleGenerator::new(clock.clone(), config.schedule_seed);
        Self {
            db,
            config,
            clock,
            generator,
        }
    }
}
