pub mod dto;
pub mod middleware;
pub mod preferences;
pub mod reminders;
pub mod rest;
pub mod schedule;
pub mod sessions;
pub mod state;
pub mod subjects;

// Re-export the router and middleware to make them easily accessible
// to the binary that builds the web server.
pub use middleware::require_user;
pub use rest::{api_router, ApiDoc};
