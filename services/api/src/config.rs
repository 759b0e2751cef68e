//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use study_planner_core::reminders::{DEFAULT_EXAM_WARNING_DAYS, DEFAULT_SESSION_LEAD_MINUTES};
use tracing::Level;

/// `DATABASE_URL` value that selects the in-process store instead of PostgreSQL.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Upper bound for `REMINDER_LEAD_MINUTES`: one week.
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 7 * 24 * 60;

/// Upper bound for `EXAM_WARNING_DAYS`.
pub const MAX_EXAM_WARNING_DAYS: i64 = 366;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    /// Fixes the shuffle used for date assignment when set.
    pub schedule_seed: Option<u64>,
    pub reminder_lead_minutes: i64,
    pub exam_warning_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Scheduling Settings ---
        let schedule_seed = std::env::var("SCHEDULE_SEED")
            .ok()
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("SCHEDULE_SEED".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let reminder_lead_minutes = parse_bounded(
            "REMINDER_LEAD_MINUTES",
            DEFAULT_SESSION_LEAD_MINUTES,
            MAX_REMINDER_LEAD_MINUTES,
        )?;
        let exam_warning_days =
            parse_bounded("EXAM_WARNING_DAYS", DEFAULT_EXAM_WARNING_DAYS, MAX_EXAM_WARNING_DAYS)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            schedule_seed,
            reminder_lead_minutes,
            exam_warning_days,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

/// Reads an integer in `1..=max`, falling back to `default` when unset.
fn parse_bounded(var: &str, default: i64, max: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.parse::<i64>() {
            Ok(value) if (1..=max).contains(&value) => Ok(value),
            _ => Err(ConfigError::InvalidValue(
                var.to_string(),
                format!("'{}' is not an integer between 1 and {}", raw, max),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-wide, so every case runs in one test.
    #[test]
    fn loads_defaults_and_rejects_bad_values() {
        std::env::remove_var("BIND_ADDRESS");
        std::env::remove_var("SCHEDULE_SEED");
        std::env::remove_var("REMINDER_LEAD_MINUTES");
        std::env::remove_var("EXAM_WARNING_DAYS");
        std::env::remove_var("CORS_ORIGIN");
        std::env::set_var("RUST_LOG", "debug");

        std::env::remove_var("DATABASE_URL");
        assert!(matches!(Config::from_env(), Err(ConfigError::MissingVar(_))));

        std::env::set_var("DATABASE_URL", MEMORY_DATABASE_URL);
        let config = Config::from_env().unwrap();
        assert!(config.uses_memory_store());
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.schedule_seed, None);
        assert_eq!(config.reminder_lead_minutes, 30);
        assert_eq!(config.exam_warning_days, 7);

        std::env::set_var("SCHEDULE_SEED", "1234");
        assert_eq!(Config::from_env().unwrap().schedule_seed, Some(1234));

        std::env::set_var("SCHEDULE_SEED", "not-a-number");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(..))));
        std::env::remove_var("SCHEDULE_SEED");

        std::env::set_var("EXAM_WARNING_DAYS", "0");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(..))));
        std::env::remove_var("EXAM_WARNING_DAYS");

        std::env::set_var("REMINDER_LEAD_MINUTES", "1000000000000");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(..))));
        std::env::set_var(
            "REMINDER_LEAD_MINUTES",
            (MAX_REMINDER_LEAD_MINUTES + 1).to_string(),
        );
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(..))));
        std::env::set_var("REMINDER_LEAD_MINUTES", MAX_REMINDER_LEAD_MINUTES.to_string());
        assert_eq!(
            Config::from_env().unwrap().reminder_lead_minutes,
            MAX_REMINDER_LEAD_MINUTES
        );
        std::env::remove_var("REMINDER_LEAD_MINUTES");
    }
}
