//! Appointment models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked by the owner, waiting for a vet
    Pending,
    /// A vet holds the appointment
    Confirmed,
    /// Medical record written
    Completed,
    Cancelled,
    Rejected,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "rejected" => Some(AppointmentStatus::Rejected),
            _ => None,
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::Rejected
        )
    }

    /// Pending and confirmed appointments can still be called off.
    pub fn is_open(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of visit requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Checkup,
    Vaccination,
    Grooming,
    Boarding,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Checkup => "checkup",
            ServiceType::Vaccination => "vaccination",
            ServiceType::Grooming => "grooming",
            ServiceType::Boarding => "boarding",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkup" => Some(ServiceType::Checkup),
            "vaccination" => Some(ServiceType::Vaccination),
            "grooming" => Some(ServiceType::Grooming),
            "boarding" => Some(ServiceType::Boarding),
            _ => None,
        }
    }
}

/// An appointment row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    pub pet_id: String,
    pub owner_id: String,
    /// Assigned vet - null only while pending
    pub vet_id: Option<String>,
    pub start_time: DateTime<Utc>,
    /// Strictly after `start_time` when present
    pub end_time: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub service_type: ServiceType,
    pub owner_note: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Create a pending, unassigned appointment ending `duration` after its start.
    ///
    /// An end past the representable range is left unset.
    pub fn new(
        pet_id: String,
        owner_id: String,
        start_time: DateTime<Utc>,
        duration: Duration,
        service_type: ServiceType,
    ) -> Self {
        let now = super::now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id,
            owner_id,
            vet_id: None,
            start_time,
            end_time: start_time.checked_add_signed(duration),
            status: AppointmentStatus::Pending,
            service_type,
            owner_note: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether nobody has claimed this appointment yet.
    pub fn is_unassigned(&self) -> bool {
        self.vet_id.is_none()
    }

    /// Whether the start time is still ahead of `now`.
    pub fn starts_after(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }

    /// Pending, unclaimed and already started.
    ///
    /// Display-only: nothing expires these rows, they keep showing as pending.
    pub fn is_stale_pending(&self, now: DateTime<Utc>) -> bool {
        self.status == AppointmentStatus::Pending && self.is_unassigned() && self.start_time <= now
    }

    /// Check the row-level invariants (vet presence and time ordering).
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(end) = self.end_time {
            if end <= self.start_time {
                return Err("End time must be after start time".into());
            }
        }
        if self.vet_id.is_none() && self.status != AppointmentStatus::Pending {
            return Err(format!(
                "Appointment in status {} must have a vet",
                self.status
            ));
        }
        Ok(())
    }
}

/// Appointment with one-hop joined display names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentView {
    pub appointment: Appointment,
    pub pet_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub vet_name: Option<String>,
}

/// Dashboard tab for appointment lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentTab {
    Upcoming,
    Past,
    Cancelled,
}

/// Vet assignment filter on the admin list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VetFilter {
    #[default]
    Any,
    Unassigned,
    Assigned,
}

/// Optional filters on the owner and admin appointment lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub pet_id: Option<String>,
    pub service_type: Option<ServiceType>,
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on start date (UTC day)
    pub from_date: Option<chrono::NaiveDate>,
    /// Inclusive upper bound on start date (UTC day)
    pub to_date: Option<chrono::NaiveDate>,
    pub vet: VetFilter,
}

impl AppointmentFilter {
    /// Filter to a single start day.
    pub fn on_day(day: chrono::NaiveDate) -> Self {
        Self {
            from_date: Some(day),
            to_date: Some(day),
            ..Self::default()
        }
    }
}
