//! Form validation run before anything touches the database.
//!
//! Messages are shown to the user as-is.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::parse_date_input;
use crate::config::Config;
use crate::models::{Role, ServiceType};

/// A form that cannot be submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select pet and dates")]
    MissingPetOrDates,

    #[error("Check-out date must be after check-in date")]
    CheckOutNotAfterCheckIn,

    #[error("Please select a room")]
    MissingRoom,

    #[error("Please confirm all requirements")]
    UnconfirmedRequirements,

    #[error("Only pet owners can create appointments.")]
    NotPetOwner,

    #[error("Please select a pet.")]
    MissingPet,

    #[error("Please select date & time.")]
    MissingStart,

    #[error("Invalid start date/time.")]
    InvalidStart,

    #[error("Appointments can be at most {max_minutes} minutes long.")]
    DurationTooLong { max_minutes: i64 },

    #[error("Please provide a rejection reason")]
    MissingReason,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

// =========================================================================
// Boarding registration wizard
// =========================================================================

/// Step 1: pet and stay dates. Returns the parsed check-in/check-out instants.
pub fn validate_booking_dates_and_pet(
    pet_id: &str,
    check_in: &str,
    check_out: &str,
) -> ValidationResult<(DateTime<Utc>, DateTime<Utc>)> {
    if pet_id.trim().is_empty() {
        return Err(ValidationError::MissingPetOrDates);
    }
    let (Some(check_in), Some(check_out)) = (parse_date_input(check_in), parse_date_input(check_out))
    else {
        return Err(ValidationError::MissingPetOrDates);
    };
    if check_out <= check_in {
        return Err(ValidationError::CheckOutNotAfterCheckIn);
    }
    Ok((check_in, check_out))
}

/// Step 2: a room is chosen.
pub fn validate_room_selection(room_id: &str) -> ValidationResult<()> {
    if room_id.trim().is_empty() {
        return Err(ValidationError::MissingRoom);
    }
    Ok(())
}

/// Step 3: the owner ticked every confirmation box.
pub fn validate_booking_confirmation(
    confirmed_terms: bool,
    confirmed_dates: bool,
    confirmed_requirements: bool,
) -> ValidationResult<()> {
    if !(confirmed_terms && confirmed_dates && confirmed_requirements) {
        return Err(ValidationError::UnconfirmedRequirements);
    }
    Ok(())
}

/// Everything the registration wizard collects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub pet_id: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub check_in: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub check_out: String,
    pub room_id: String,
    pub special_notes: Option<String>,
    pub dietary_requirements: Option<String>,
    pub medical_requirements: Option<String>,
    pub confirmed_terms: bool,
    pub confirmed_dates: bool,
    pub confirmed_requirements: bool,
}

/// A booking request that passed all three steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

impl BookingRequest {
    /// Run the wizard steps in order, stopping at the first failure.
    pub fn validate(&self) -> ValidationResult<ValidBooking> {
        let (check_in, check_out) =
            validate_booking_dates_and_pet(&self.pet_id, &self.check_in, &self.check_out)?;
        validate_room_selection(&self.room_id)?;
        validate_booking_confirmation(
            self.confirmed_terms,
            self.confirmed_dates,
            self.confirmed_requirements,
        )?;
        Ok(ValidBooking {
            check_in,
            check_out,
        })
    }
}

// =========================================================================
// Appointment creation
// =========================================================================

/// Owner's appointment form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRequest {
    pub pet_id: String,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM` in the clinic's local time
    pub start: String,
    /// Requested length; missing or zero means the configured default
    pub duration_minutes: Option<i64>,
    pub service_type: ServiceType,
    /// Optional preferred vet
    pub vet_id: Option<String>,
    pub owner_note: Option<String>,
}

/// Validated appointment window.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAppointment {
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
}

impl AppointmentRequest {
    /// Validate for `role`, reading local datetimes in `tz`.
    pub fn validate<Tz: TimeZone>(
        &self,
        role: Role,
        tz: &Tz,
        config: &Config,
    ) -> ValidationResult<ValidAppointment> {
        if role != Role::PetOwner {
            return Err(ValidationError::NotPetOwner);
        }
        if self.pet_id.trim().is_empty() {
            return Err(ValidationError::MissingPet);
        }
        if self.start.trim().is_empty() {
            return Err(ValidationError::MissingStart);
        }
        let start_time = parse_local_datetime(&self.start, tz).ok_or(ValidationError::InvalidStart)?;
        let minutes = appointment_minutes(self.duration_minutes, config)?;
        let duration = Duration::try_minutes(minutes).ok_or(ValidationError::DurationTooLong {
            max_minutes: config.max_appointment_minutes,
        })?;
        // The end must still be a representable instant.
        start_time
            .checked_add_signed(duration)
            .ok_or(ValidationError::InvalidStart)?;
        Ok(ValidAppointment {
            start_time,
            duration,
        })
    }
}

/// Effective appointment length: the request, or the default, never below the
/// minimum. Anything above the configured maximum is refused.
pub fn appointment_minutes(requested: Option<i64>, config: &Config) -> ValidationResult<i64> {
    let minutes = match requested {
        Some(minutes) if minutes != 0 => minutes,
        _ => config.default_appointment_minutes,
    }
    .max(config.min_appointment_minutes);
    if minutes > config.max_appointment_minutes {
        return Err(ValidationError::DurationTooLong {
            max_minutes: config.max_appointment_minutes,
        });
    }
    Ok(minutes)
}

/// Parse RFC 3339, or a `datetime-local` style value interpreted in `tz`.
pub fn parse_local_datetime<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Some(at) = crate::models::parse_timestamp(s) {
        return Some(at);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// A boarding rejection needs a non-blank reason.
pub fn validate_rejection_reason(reason: &str) -> ValidationResult<&str> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::MissingReason);
    }
    Ok(reason)
}
