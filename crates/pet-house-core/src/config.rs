//! Runtime configuration and logging setup.

use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "Pet House";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings read from `PET_HOUSE_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Appointment length when the owner does not pick one
    pub default_appointment_minutes: i64,
    /// Shortest appointment the clinic books
    pub min_appointment_minutes: i64,
    /// Longest appointment the clinic books
    pub max_appointment_minutes: i64,
    /// How long a connection waits on a locked database
    pub busy_timeout: Duration,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pet_house.db"),
            default_appointment_minutes: 30,
            min_appointment_minutes: 5,
            max_appointment_minutes: 24 * 60,
            busy_timeout: Duration::from_millis(5000),
            log_filter: "info".into(),
        }
    }
}

impl Config {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Unparseable numbers keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<i64>().ok());

        Self {
            database_path: lookup("PET_HOUSE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            default_appointment_minutes: number("PET_HOUSE_APPOINTMENT_MINUTES")
                .unwrap_or(defaults.default_appointment_minutes),
            min_appointment_minutes: number("PET_HOUSE_MIN_APPOINTMENT_MINUTES")
                .unwrap_or(defaults.min_appointment_minutes),
            max_appointment_minutes: number("PET_HOUSE_MAX_APPOINTMENT_MINUTES")
                .unwrap_or(defaults.max_appointment_minutes),
            busy_timeout: number("PET_HOUSE_BUSY_TIMEOUT_MS")
                .and_then(|ms| u64::try_from(ms).ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
            log_filter: lookup("PET_HOUSE_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

/// Install the global `tracing` subscriber. Later calls are no-ops.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        tracing::debug!(app = APP_NAME, version = APP_VERSION, "tracing initialised");
    }
}
