//! Pet House Core Library
//!
//! Local-first back end for a pet-care center: vet appointments, boarding
//! stays, medical records and notifications over a single SQLite file.
//!
//! # Architecture
//!
//! ```text
//! Form ──▶ validation ──▶ lifecycle check ──▶ guarded UPDATE ──▶ audit chain
//!                                                  │                  │
//!                                           affected rows = 0?   prev_hash → hash
//!                                                  │
//!                                     ┌────────────┴────────────┐
//!                                     ▼                         ▼
//!                               StaleState /              notification
//!                              AlreadyClaimed            (NotifyHub fan-out)
//! ```
//!
//! # Core Principle
//!
//! **Every status change is a guarded update.** The `WHERE` clause restates
//! the state the caller saw; if another user got there first, nothing is
//! written and the caller is told.
//!
//! # Modules
//!
//! - [`lifecycle`]: Status-transition rules for appointments and boarding
//! - [`calendar`]: Stay pricing and day-bucketed calendar views
//! - [`validation`]: Form checks before anything is written
//! - [`db`]: SQLite schema and table operations
//! - [`audit`]: Hash-chained log of status transitions
//! - [`scheduling`]: Service objects for user actions
//! - [`session`]: Signed-in user and the auth service contract
//! - [`notify`]: Per-user notification channels
//! - [`export`]: Boarding analytics and payments export

pub mod audit;
pub mod calendar;
pub mod config;
pub mod db;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod scheduling;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use audit::AuditTrail;
pub use calendar::{days_between, month_grid, total_price, DayBuckets, GridCell, RoomOccupancy};
pub use config::Config;
pub use db::Database;
pub use lifecycle::{Actor, AppointmentAction, BoardingAction, TransitionError};
pub use models::{
    Appointment, AppointmentStatus, AppointmentTab, AppointmentView, BoardingBooking,
    BoardingRoom, BoardingStatus, BookingView, MedicalRecord, Notification, PaymentStatus, Pet,
    Role, ServiceType, UserProfile,
};
pub use notify::NotifyHub;
pub use scheduling::{
    AdminService, AppointmentService, BoardingService, ClaimOutcome, MedicalRecordService,
    ScheduleError,
};
pub use session::{AuthService, Session, SessionManager};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, Utc};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PetHouseError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for PetHouseError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PetHouseError::NotFound(what),
            other => PetHouseError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PetHouseError {
    fn from(e: serde_json::Error) -> Self {
        PetHouseError::SerializationError(e.to_string())
    }
}

impl From<audit::AuditError> for PetHouseError {
    fn from(e: audit::AuditError) -> Self {
        PetHouseError::DatabaseError(e.to_string())
    }
}

impl From<TransitionError> for PetHouseError {
    fn from(e: TransitionError) -> Self {
        PetHouseError::NotPermitted(e.to_string())
    }
}

impl From<validation::ValidationError> for PetHouseError {
    fn from(e: validation::ValidationError) -> Self {
        PetHouseError::InvalidInput(e.to_string())
    }
}

impl From<session::AuthError> for PetHouseError {
    fn from(e: session::AuthError) -> Self {
        match e {
            session::AuthError::Database(db) => db.into(),
            other => PetHouseError::AuthError(other.to_string()),
        }
    }
}

impl From<ScheduleError> for PetHouseError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::Database(db) => db.into(),
            ScheduleError::Audit(audit) => audit.into(),
            ScheduleError::Transition(t) => t.into(),
            ScheduleError::Validation(v) => v.into(),
            ScheduleError::NotFound(what) => PetHouseError::NotFound(what),
            e @ ScheduleError::Forbidden(_) | e @ ScheduleError::MedicalRecordRequired => {
                PetHouseError::NotPermitted(e.to_string())
            }
            e @ ScheduleError::StaleState(_) => PetHouseError::Conflict(e.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for PetHouseError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PetHouseError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PetHouseCore>, PetHouseError> {
    let config = Config {
        database_path: path.into(),
        ..Config::default()
    };
    PetHouseCore::open(config)
}

/// Open the database named by `PET_HOUSE_*` environment variables and install logging.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<PetHouseCore>, PetHouseError> {
    let config = Config::from_env();
    config::init_tracing(&config);
    PetHouseCore::open(config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PetHouseCore>, PetHouseError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PetHouseCore {
        db: Arc::new(Mutex::new(db)),
        config: Config::default(),
    }))
}

/// Billable days between two `YYYY-MM-DD` or RFC 3339 dates; 0 when either is missing.
#[uniffi::export]
pub fn stay_days(check_in: String, check_out: String) -> i64 {
    calendar::days_between_str(&check_in, &check_out)
}

/// Price of a stay, never less than one day.
#[uniffi::export]
pub fn stay_price(price_per_day: f64, days: i64) -> f64 {
    total_price(price_per_day, days)
}

/// 42-cell Monday-first grid for a month.
#[uniffi::export]
pub fn month_grid_cells(year: i32, month: u32) -> Result<Vec<FfiGridCell>, PetHouseError> {
    let cells = month_grid(year, month)
        .ok_or_else(|| PetHouseError::InvalidInput(format!("Invalid month {year}-{month}")))?;
    Ok(cells.into_iter().map(|c| c.into()).collect())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Every call names the acting user by profile id; the caller's role is read
/// from the profile row.
#[derive(uniffi::Object)]
pub struct PetHouseCore {
    db: Arc<Mutex<Database>>,
    config: Config,
}

impl PetHouseCore {
    fn open(config: Config) -> Result<Arc<Self>, PetHouseError> {
        let db = Database::open_with_config(&config, Arc::new(NotifyHub::new()))?;
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }
}

#[uniffi::export]
impl PetHouseCore {
    // =========================================================================
    // Profiles & Pets
    // =========================================================================

    /// Store the profile for a user the auth service just created.
    pub fn create_profile(
        &self,
        user_id: String,
        email: String,
        full_name: String,
        role: String,
    ) -> Result<FfiProfile, PetHouseError> {
        let db = self.db.lock()?;
        let profile = UserProfile::new(user_id, email, full_name, parse_role(&role)?);
        db.insert_profile(&profile)?;
        Ok(profile.into())
    }

    pub fn get_profile(&self, user_id: String) -> Result<Option<FfiProfile>, PetHouseError> {
        let db = self.db.lock()?;
        Ok(db.get_profile(&user_id)?.map(|p| p.into()))
    }

    /// Add a pet for an owner.
    pub fn add_pet(
        &self,
        owner_id: String,
        name: String,
        species: String,
        breed: Option<String>,
    ) -> Result<FfiPet, PetHouseError> {
        let db = self.db.lock()?;
        let mut pet = Pet::new(owner_id, name, species);
        pet.breed = breed;
        db.insert_pet(&pet)?;
        Ok(pet.into())
    }

    pub fn list_pets(&self, owner_id: String) -> Result<Vec<FfiPet>, PetHouseError> {
        let db = self.db.lock()?;
        let pets = db.list_pets_for_owner(&owner_id)?;
        Ok(pets.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment. Local start times are read at `utc_offset_minutes`.
    pub fn create_appointment(
        &self,
        actor_id: String,
        request: FfiAppointmentRequest,
        utc_offset_minutes: i32,
    ) -> Result<FfiAppointment, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let tz = fixed_offset(utc_offset_minutes)?;
        let request = validation::AppointmentRequest {
            pet_id: request.pet_id,
            start: request.start,
            duration_minutes: request.duration_minutes,
            service_type: parse_service(&request.service_type)?,
            vet_id: request.vet_id,
            owner_note: request.owner_note,
        };
        let view = AppointmentService::new(&db, &self.config).create(&actor, &request, &tz)?;
        Ok(view.into())
    }

    /// Claim an unassigned appointment. A lost race returns `claimed = false`.
    pub fn claim_appointment(
        &self,
        actor_id: String,
        appointment_id: String,
    ) -> Result<FfiClaimResult, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let outcome =
            AppointmentService::new(&db, &self.config).claim(&actor, &appointment_id, Utc::now())?;
        Ok(match outcome {
            ClaimOutcome::Claimed(view) => FfiClaimResult {
                claimed: true,
                appointment: Some(view.into()),
            },
            ClaimOutcome::AlreadyClaimed => FfiClaimResult {
                claimed: false,
                appointment: None,
            },
        })
    }

    pub fn accept_appointment(
        &self,
        actor_id: String,
        appointment_id: String,
    ) -> Result<FfiAppointment, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = AppointmentService::new(&db, &self.config).accept_assigned(
            &actor,
            &appointment_id,
            Utc::now(),
        )?;
        Ok(view.into())
    }

    pub fn cancel_appointment(
        &self,
        actor_id: String,
        appointment_id: String,
    ) -> Result<FfiAppointment, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view =
            AppointmentService::new(&db, &self.config).cancel(&actor, &appointment_id, Utc::now())?;
        Ok(view.into())
    }

    pub fn reject_appointment(
        &self,
        actor_id: String,
        appointment_id: String,
    ) -> Result<FfiAppointment, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view =
            AppointmentService::new(&db, &self.config).reject(&actor, &appointment_id, Utc::now())?;
        Ok(view.into())
    }

    /// Dashboard list for `tab` (`upcoming`, `past` or `cancelled`).
    pub fn list_appointments(
        &self,
        actor_id: String,
        tab: String,
    ) -> Result<Vec<FfiAppointment>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let views = AppointmentService::new(&db, &self.config).list(
            &actor,
            parse_tab(&tab)?,
            &models::AppointmentFilter::default(),
            Utc::now(),
        )?;
        Ok(views.into_iter().map(|v| v.into()).collect())
    }

    /// Appointment counts per local day for a calendar, keyed `YYYY-MM-DD`.
    pub fn appointment_day_counts(
        &self,
        actor_id: String,
        tab: String,
        utc_offset_minutes: i32,
    ) -> Result<Vec<FfiDayCount>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let tz = fixed_offset(utc_offset_minutes)?;
        let views = AppointmentService::new(&db, &self.config).list(
            &actor,
            parse_tab(&tab)?,
            &models::AppointmentFilter::default(),
            Utc::now(),
        )?;
        Ok(day_counts(&DayBuckets::build(&views, &tz)))
    }

    // =========================================================================
    // Medical Records
    // =========================================================================

    /// Write the medical record, completing the appointment.
    pub fn complete_appointment(
        &self,
        actor_id: String,
        appointment_id: String,
        input: FfiMedicalRecordInput,
    ) -> Result<FfiMedicalRecord, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let record = MedicalRecordService::new(&db).complete(
            &actor,
            &appointment_id,
            input.into(),
            Utc::now(),
        )?;
        Ok(record.into())
    }

    pub fn get_medical_record(
        &self,
        actor_id: String,
        appointment_id: String,
    ) -> Result<Option<FfiMedicalRecord>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let record = MedicalRecordService::new(&db).get(&actor, &appointment_id)?;
        Ok(record.map(|r| r.into()))
    }

    // =========================================================================
    // Boarding Operations
    // =========================================================================

    pub fn available_rooms(&self) -> Result<Vec<FfiRoom>, PetHouseError> {
        let db = self.db.lock()?;
        let rooms = BoardingService::new(&db).available_rooms()?;
        Ok(rooms.into_iter().map(|r| r.into()).collect())
    }

    pub fn create_room(
        &self,
        actor_id: String,
        name: String,
        capacity: u32,
        price_per_day: f64,
    ) -> Result<FfiRoom, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let room = BoardingService::new(&db).create_room(
            &actor,
            BoardingRoom::new(name, capacity, price_per_day),
        )?;
        Ok(room.into())
    }

    pub fn set_room_availability(
        &self,
        actor_id: String,
        room_id: String,
        is_available: bool,
    ) -> Result<(), PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        BoardingService::new(&db).set_room_availability(&actor, &room_id, is_available)?;
        Ok(())
    }

    /// Submit the boarding registration wizard.
    pub fn create_booking(
        &self,
        actor_id: String,
        request: FfiBookingRequest,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).create_booking(&actor, &request.into())?;
        Ok(view.into())
    }

    pub fn approve_booking(
        &self,
        actor_id: String,
        booking_id: String,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).approve(&actor, &booking_id, Utc::now())?;
        Ok(view.into())
    }

    pub fn reject_booking(
        &self,
        actor_id: String,
        booking_id: String,
        reason: String,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).reject(&actor, &booking_id, &reason, Utc::now())?;
        Ok(view.into())
    }

    pub fn check_in_booking(
        &self,
        actor_id: String,
        booking_id: String,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).check_in(&actor, &booking_id, Utc::now())?;
        Ok(view.into())
    }

    pub fn check_out_booking(
        &self,
        actor_id: String,
        booking_id: String,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).check_out(&actor, &booking_id, Utc::now())?;
        Ok(view.into())
    }

    pub fn mark_booking_paid(
        &self,
        actor_id: String,
        booking_id: String,
    ) -> Result<FfiBooking, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let view = BoardingService::new(&db).mark_paid(&actor, &booking_id, Utc::now())?;
        Ok(view.into())
    }

    pub fn booking_rejection_reason(
        &self,
        booking_id: String,
    ) -> Result<Option<String>, PetHouseError> {
        let db = self.db.lock()?;
        Ok(BoardingService::new(&db).rejection_reason(&booking_id)?)
    }

    /// The owner's bookings, newest first.
    pub fn list_owner_bookings(&self, actor_id: String) -> Result<Vec<FfiBooking>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let views = BoardingService::new(&db).list_for_owner(&actor)?;
        Ok(views.into_iter().map(|v| v.into()).collect())
    }

    /// Staff dashboard: bookings in any of `statuses`.
    pub fn list_bookings_by_status(
        &self,
        actor_id: String,
        statuses: Vec<String>,
    ) -> Result<Vec<FfiBooking>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let statuses = statuses
            .iter()
            .map(|s| parse_boarding_status(s))
            .collect::<Result<Vec<_>, _>>()?;
        let views = BoardingService::new(&db).list_by_status(&actor, &statuses)?;
        Ok(views.into_iter().map(|v| v.into()).collect())
    }

    /// Owner's check-ins per local day, keyed `YYYY-MM-DD`.
    pub fn booking_day_counts(
        &self,
        actor_id: String,
        utc_offset_minutes: i32,
    ) -> Result<Vec<FfiDayCount>, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let tz = fixed_offset(utc_offset_minutes)?;
        let views = BoardingService::new(&db).list_for_owner(&actor)?;
        Ok(day_counts(&DayBuckets::build(&views, &tz)))
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn list_notifications(
        &self,
        user_id: String,
    ) -> Result<Vec<FfiNotification>, PetHouseError> {
        let db = self.db.lock()?;
        let notifications = db.list_notifications(&user_id)?;
        Ok(notifications.into_iter().map(|n| n.into()).collect())
    }

    pub fn mark_notification_read(
        &self,
        user_id: String,
        notification_id: String,
    ) -> Result<bool, PetHouseError> {
        let db = self.db.lock()?;
        Ok(db.mark_notification_read(&notification_id, &user_id)?)
    }

    pub fn mark_all_notifications_read(&self, user_id: String) -> Result<u32, PetHouseError> {
        let db = self.db.lock()?;
        Ok(db.mark_all_notifications_read(&user_id)? as u32)
    }

    pub fn unread_notification_count(&self, user_id: String) -> Result<u32, PetHouseError> {
        let db = self.db.lock()?;
        Ok(db.unread_notification_count(&user_id)? as u32)
    }

    // =========================================================================
    // Admin & Export Operations
    // =========================================================================

    pub fn role_counts(&self, actor_id: String) -> Result<FfiRoleCounts, PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        let counts = AdminService::new(&db).role_counts(&actor)?;
        Ok(counts.into())
    }

    /// Delete another user's profile (admin only, never one's own).
    pub fn delete_profile(&self, actor_id: String, profile_id: String) -> Result<(), PetHouseError> {
        let db = self.db.lock()?;
        let actor = load_actor(&db, &actor_id)?;
        AdminService::new(&db).delete_profile(&actor, &profile_id)?;
        Ok(())
    }

    /// Boarding analytics as JSON.
    pub fn export_boarding_analytics_json(&self, actor_id: String) -> Result<String, PetHouseError> {
        let db = self.db.lock()?;
        require_admin(&load_actor(&db, &actor_id)?)?;
        let analytics = export::boarding_analytics(&db)?;
        Ok(analytics.to_json()?)
    }

    /// Payments ledger as JSON. `filter` is `all`, `paid` or `unpaid`.
    pub fn export_payments_json(
        &self,
        actor_id: String,
        filter: String,
        search: String,
    ) -> Result<String, PetHouseError> {
        let db = self.db.lock()?;
        require_admin(&load_actor(&db, &actor_id)?)?;
        let report = export::PaymentsExporter::new(&db).report(parse_payment_filter(&filter)?, &search)?;
        Ok(report.to_json()?)
    }

    /// Payments ledger as CSV.
    pub fn export_payments_csv(
        &self,
        actor_id: String,
        filter: String,
        search: String,
    ) -> Result<String, PetHouseError> {
        let db = self.db.lock()?;
        require_admin(&load_actor(&db, &actor_id)?)?;
        let report = export::PaymentsExporter::new(&db).report(parse_payment_filter(&filter)?, &search)?;
        Ok(report.to_csv())
    }

    /// Re-hash the audit trail; returns the number of events checked.
    pub fn verify_audit_trail(&self) -> Result<u32, PetHouseError> {
        let db = self.db.lock()?;
        Ok(AuditTrail::new(&db).verify()? as u32)
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn load_actor(db: &Database, actor_id: &str) -> Result<Actor, PetHouseError> {
    db.get_profile(actor_id)?
        .map(|profile| Actor::from(&profile))
        .ok_or_else(|| PetHouseError::NotFound(format!("Profile {actor_id}")))
}

fn require_admin(actor: &Actor) -> Result<(), PetHouseError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(PetHouseError::NotPermitted(format!(
            "Role {} may not view reports",
            actor.role
        )))
    }
}

fn fixed_offset(minutes: i32) -> Result<FixedOffset, PetHouseError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| PetHouseError::InvalidInput(format!("Invalid UTC offset: {minutes} minutes")))
}

fn day_counts<T: calendar::Scheduled>(buckets: &DayBuckets<'_, T>) -> Vec<FfiDayCount> {
    buckets
        .counts()
        .into_iter()
        .map(|(day, count)| FfiDayCount {
            day,
            count: count as u32,
        })
        .collect()
}

fn parse_role(s: &str) -> Result<Role, PetHouseError> {
    Role::parse(s).ok_or_else(|| PetHouseError::InvalidInput(format!("Unknown role: {s}")))
}

fn parse_service(s: &str) -> Result<ServiceType, PetHouseError> {
    ServiceType::parse(s)
        .ok_or_else(|| PetHouseError::InvalidInput(format!("Unknown service type: {s}")))
}

fn parse_boarding_status(s: &str) -> Result<BoardingStatus, PetHouseError> {
    BoardingStatus::parse(s)
        .ok_or_else(|| PetHouseError::InvalidInput(format!("Unknown boarding status: {s}")))
}

fn parse_tab(s: &str) -> Result<AppointmentTab, PetHouseError> {
    match s {
        "upcoming" => Ok(AppointmentTab::Upcoming),
        "past" => Ok(AppointmentTab::Past),
        "cancelled" => Ok(AppointmentTab::Cancelled),
        _ => Err(PetHouseError::InvalidInput(format!("Unknown tab: {s}"))),
    }
}

fn parse_payment_filter(s: &str) -> Result<export::PaymentFilter, PetHouseError> {
    match s {
        "" | "all" => Ok(export::PaymentFilter::All),
        "paid" => Ok(export::PaymentFilter::Paid),
        "unpaid" => Ok(export::PaymentFilter::Unpaid),
        _ => Err(PetHouseError::InvalidInput(format!("Unknown payment filter: {s}"))),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub phone: Option<String>,
}

impl From<UserProfile> for FfiProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role.as_str().to_string(),
            phone: profile.phone,
        }
    }
}

/// FFI-safe pet.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
}

impl From<Pet> for FfiPet {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            owner_id: pet.owner_id,
            name: pet.name,
            species: pet.species,
            breed: pet.breed,
        }
    }
}

/// FFI-safe appointment form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentRequest {
    pub pet_id: String,
    pub start: String,
    pub duration_minutes: Option<i64>,
    pub service_type: String,
    pub vet_id: Option<String>,
    pub owner_note: Option<String>,
}

/// FFI-safe appointment with display names.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub pet_id: String,
    pub owner_id: String,
    pub vet_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: String,
    pub service_type: String,
    pub owner_note: Option<String>,
    pub pet_name: Option<String>,
    pub owner_name: Option<String>,
    pub vet_name: Option<String>,
}

impl From<AppointmentView> for FfiAppointment {
    fn from(view: AppointmentView) -> Self {
        let appt = view.appointment;
        Self {
            id: appt.id,
            pet_id: appt.pet_id,
            owner_id: appt.owner_id,
            vet_id: appt.vet_id,
            start_time: models::timestamp(&appt.start_time),
            end_time: appt.end_time.as_ref().map(models::timestamp),
            status: appt.status.as_str().to_string(),
            service_type: appt.service_type.as_str().to_string(),
            owner_note: appt.owner_note,
            pet_name: view.pet_name,
            owner_name: view.owner_name,
            vet_name: view.vet_name,
        }
    }
}

/// FFI-safe claim result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClaimResult {
    pub claimed: bool,
    pub appointment: Option<FfiAppointment>,
}

/// FFI-safe medical record form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecordInput {
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub doctor_notes: Option<String>,
}

impl From<FfiMedicalRecordInput> for models::MedicalRecordInput {
    fn from(input: FfiMedicalRecordInput) -> Self {
        Self {
            symptoms: input.symptoms,
            diagnosis: input.diagnosis,
            treatment: input.treatment,
            prescription: input.prescription,
            doctor_notes: input.doctor_notes,
        }
    }
}

/// FFI-safe medical record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecord {
    pub id: String,
    pub appointment_id: String,
    pub pet_id: String,
    pub vet_id: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub doctor_notes: Option<String>,
    pub created_at: String,
}

impl From<MedicalRecord> for FfiMedicalRecord {
    fn from(record: MedicalRecord) -> Self {
        Self {
            id: record.id,
            appointment_id: record.appointment_id,
            pet_id: record.pet_id,
            vet_id: record.vet_id,
            symptoms: record.symptoms,
            diagnosis: record.diagnosis,
            treatment: record.treatment,
            prescription: record.prescription,
            doctor_notes: record.doctor_notes,
            created_at: record.created_at,
        }
    }
}

/// FFI-safe boarding room.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoom {
    pub id: String,
    pub name: String,
    pub room_type: Option<String>,
    pub capacity: u32,
    pub price_per_day: f64,
    pub is_available: bool,
}

impl From<BoardingRoom> for FfiRoom {
    fn from(room: BoardingRoom) -> Self {
        Self {
            id: room.id,
            name: room.name,
            room_type: room.room_type,
            capacity: room.capacity,
            price_per_day: room.price_per_day,
            is_available: room.is_available,
        }
    }
}

/// FFI-safe booking wizard contents.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingRequest {
    pub pet_id: String,
    pub check_in: String,
    pub check_out: String,
    pub room_id: String,
    pub special_notes: Option<String>,
    pub dietary_requirements: Option<String>,
    pub medical_requirements: Option<String>,
    pub confirmed_terms: bool,
    pub confirmed_dates: bool,
    pub confirmed_requirements: bool,
}

impl From<FfiBookingRequest> for validation::BookingRequest {
    fn from(req: FfiBookingRequest) -> Self {
        Self {
            pet_id: req.pet_id,
            check_in: req.check_in,
            check_out: req.check_out,
            room_id: req.room_id,
            special_notes: req.special_notes,
            dietary_requirements: req.dietary_requirements,
            medical_requirements: req.medical_requirements,
            confirmed_terms: req.confirmed_terms,
            confirmed_dates: req.confirmed_dates,
            confirmed_requirements: req.confirmed_requirements,
        }
    }
}

/// FFI-safe booking with display names.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBooking {
    pub id: String,
    pub pet_id: String,
    pub owner_id: String,
    pub room_id: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub days: i64,
    pub price_per_day: f64,
    pub total_price: f64,
    pub status: String,
    pub payment_status: String,
    pub pet_name: Option<String>,
    pub room_name: Option<String>,
    pub owner_name: Option<String>,
}

impl From<BookingView> for FfiBooking {
    fn from(view: BookingView) -> Self {
        let days = view.booking.days();
        let b = view.booking;
        Self {
            id: b.id,
            pet_id: b.pet_id,
            owner_id: b.owner_id,
            room_id: b.room_id,
            check_in_date: models::timestamp(&b.check_in_date),
            check_out_date: models::timestamp(&b.check_out_date),
            days,
            price_per_day: b.price_per_day,
            total_price: b.total_price,
            status: b.status.as_str().to_string(),
            payment_status: b.payment_status.as_str().to_string(),
            pet_name: view.pet_name,
            room_name: view.room_name,
            owner_name: view.owner_name,
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// FFI-safe calendar day count.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDayCount {
    /// `YYYY-MM-DD`
    pub day: String,
    pub count: u32,
}

/// FFI-safe month grid cell.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGridCell {
    pub day: String,
    pub in_month: bool,
}

impl From<GridCell> for FfiGridCell {
    fn from(cell: GridCell) -> Self {
        Self {
            day: cell.key(),
            in_month: cell.in_month,
        }
    }
}

/// FFI-safe profile counts.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRoleCounts {
    pub admins: u32,
    pub staff: u32,
    pub vets: u32,
    pub pet_owners: u32,
}

impl From<models::RoleCounts> for FfiRoleCounts {
    fn from(counts: models::RoleCounts) -> Self {
        Self {
            admins: counts.admins as u32,
            staff: counts.staff as u32,
            vets: counts.vets as u32,
            pet_owners: counts.pet_owners as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_with_users() -> Arc<PetHouseCore> {
        let core = open_database_in_memory().unwrap();
        for (id, role) in [
            ("owner-1", "pet_owner"),
            ("vet-1", "vet"),
            ("staff-1", "staff"),
            ("admin-1", "admin"),
        ] {
            core.create_profile(id.into(), format!("{id}@pethouse.test"), id.into(), role.into())
                .unwrap();
        }
        core
    }

    fn future_start() -> String {
        models::timestamp(&(Utc::now() + chrono::Duration::days(2)))
    }

    #[test]
    fn test_appointment_claim_and_complete() {
        let core = core_with_users();
        let pet = core
            .add_pet("owner-1".into(), "Rex".into(), "dog".into(), None)
            .unwrap();

        let appt = core
            .create_appointment(
                "owner-1".into(),
                FfiAppointmentRequest {
                    pet_id: pet.id.clone(),
                    start: future_start(),
                    duration_minutes: None,
                    service_type: "checkup".into(),
                    vet_id: None,
                    owner_note: Some("Limping".into()),
                },
                0,
            )
            .unwrap();
        assert_eq!(appt.status, "pending");
        assert!(appt.vet_id.is_none());

        let first = core.claim_appointment("vet-1".into(), appt.id.clone()).unwrap();
        assert!(first.claimed);
        let claimed = first.appointment.unwrap();
        assert_eq!(claimed.status, "confirmed");
        assert_eq!(claimed.vet_id.as_deref(), Some("vet-1"));

        let second = core.claim_appointment("vet-1".into(), appt.id.clone()).unwrap();
        assert!(!second.claimed);

        let record = core
            .complete_appointment(
                "vet-1".into(),
                appt.id.clone(),
                FfiMedicalRecordInput {
                    symptoms: Some("Limping".into()),
                    diagnosis: Some("Sprain".into()),
                    treatment: None,
                    prescription: None,
                    doctor_notes: None,
                },
            )
            .unwrap();
        assert_eq!(record.appointment_id, appt.id);

        let read_back = core
            .get_medical_record("owner-1".into(), appt.id.clone())
            .unwrap()
            .unwrap();
        assert_eq!(read_back.diagnosis.as_deref(), Some("Sprain"));

        assert!(core.unread_notification_count("owner-1".into()).unwrap() >= 2);
        assert!(core.verify_audit_trail().unwrap() >= 3);
    }

    #[test]
    fn test_oversized_appointment_is_invalid_input() {
        let core = core_with_users();
        let pet = core
            .add_pet("owner-1".into(), "Rex".into(), "dog".into(), None)
            .unwrap();

        let err = core
            .create_appointment(
                "owner-1".into(),
                FfiAppointmentRequest {
                    pet_id: pet.id,
                    start: future_start(),
                    duration_minutes: Some(1_000_000_000_000),
                    service_type: "checkup".into(),
                    vet_id: None,
                    owner_note: None,
                },
                0,
            )
            .unwrap_err();
        assert!(matches!(err, PetHouseError::InvalidInput(_)));
        assert!(core
            .list_appointments("owner-1".into(), "upcoming".into())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_booking_flow_and_payments_export() {
        let core = core_with_users();
        let pet = core
            .add_pet("owner-1".into(), "Tom".into(), "cat".into(), None)
            .unwrap();
        let room = core
            .create_room("admin-1".into(), "Sunny".into(), 2, 25.0)
            .unwrap();

        let booking = core
            .create_booking(
                "owner-1".into(),
                FfiBookingRequest {
                    pet_id: pet.id,
                    check_in: "2030-03-01".into(),
                    check_out: "2030-03-04".into(),
                    room_id: room.id,
                    special_notes: None,
                    dietary_requirements: None,
                    medical_requirements: None,
                    confirmed_terms: true,
                    confirmed_dates: true,
                    confirmed_requirements: true,
                },
            )
            .unwrap();
        assert_eq!(booking.days, 3);
        assert_eq!(booking.total_price, 75.0);

        core.approve_booking("staff-1".into(), booking.id.clone()).unwrap();
        core.check_in_booking("staff-1".into(), booking.id.clone()).unwrap();
        let paid = core
            .mark_booking_paid("admin-1".into(), booking.id.clone())
            .unwrap();
        assert_eq!(paid.payment_status, "paid");

        let csv = core
            .export_payments_csv("admin-1".into(), "paid".into(), "".into())
            .unwrap();
        assert!(csv.contains(&booking.id));
        assert!(csv.contains("75.00"));

        let denied = core.export_payments_json("staff-1".into(), "all".into(), "".into());
        assert!(matches!(denied, Err(PetHouseError::NotPermitted(_))));
    }

    #[test]
    fn test_reject_booking_keeps_reason() {
        let core = core_with_users();
        let pet = core
            .add_pet("owner-1".into(), "Tom".into(), "cat".into(), None)
            .unwrap();
        let room = core
            .create_room("admin-1".into(), "Sunny".into(), 2, 25.0)
            .unwrap();
        let booking = core
            .create_booking(
                "owner-1".into(),
                FfiBookingRequest {
                    pet_id: pet.id,
                    check_in: "2030-03-01".into(),
                    check_out: "2030-03-02".into(),
                    room_id: room.id,
                    special_notes: None,
                    dietary_requirements: None,
                    medical_requirements: None,
                    confirmed_terms: true,
                    confirmed_dates: true,
                    confirmed_requirements: true,
                },
            )
            .unwrap();

        let blank = core.reject_booking("staff-1".into(), booking.id.clone(), "  ".into());
        assert!(matches!(blank, Err(PetHouseError::InvalidInput(_))));

        let rejected = core
            .reject_booking("staff-1".into(), booking.id.clone(), "Fully booked".into())
            .unwrap();
        assert_eq!(rejected.status, "cancelled");
        assert_eq!(
            core.booking_rejection_reason(booking.id).unwrap().as_deref(),
            Some("Fully booked")
        );
    }

    #[test]
    fn test_delete_profile_refuses_self() {
        let core = core_with_users();
        let err = core
            .delete_profile("admin-1".into(), "admin-1".into())
            .unwrap_err();
        assert!(matches!(err, PetHouseError::NotPermitted(_)));

        core.delete_profile("admin-1".into(), "staff-1".into()).unwrap();
        let counts = core.role_counts("admin-1".into()).unwrap();
        assert_eq!(counts.staff, 0);
        assert_eq!(counts.admins, 1);
    }

    #[test]
    fn test_unknown_actor() {
        let core = core_with_users();
        let err = core.list_appointments("ghost".into(), "upcoming".into()).unwrap_err();
        assert!(matches!(err, PetHouseError::NotFound(_)));
    }

    #[test]
    fn test_calendar_helpers() {
        assert_eq!(stay_days("2024-01-10".into(), "2024-01-13".into()), 3);
        assert_eq!(stay_days("".into(), "2024-01-13".into()), 0);
        assert_eq!(stay_price(40.0, 0), 40.0);

        let cells = month_grid_cells(2024, 2).unwrap();
        assert_eq!(cells.len(), 42);
        assert_eq!(cells[0].day, "2024-01-29");
        assert!(month_grid_cells(2024, 13).is_err());
        assert!(fixed_offset(i32::MAX).is_err());
    }
}
