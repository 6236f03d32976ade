//! Domain models for the pet house system.

mod appointment;
mod audit;
mod boarding;
mod medical;
mod notification;
mod pet;
mod profile;

pub use appointment::*;
pub use audit::*;
pub use boarding::*;
pub use medical::*;
pub use notification::*;
pub use pet::*;
pub use profile::*;

use chrono::{DateTime, SecondsFormat, Utc};

/// Render an instant the way every table stores it.
///
/// Fixed millisecond precision with a `Z` suffix keeps lexical order equal to
/// chronological order, which the range filters in `db` rely on.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in storage format.
pub fn now_timestamp() -> String {
    timestamp(&Utc::now())
}

/// Parse a stored timestamp back into an instant.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
