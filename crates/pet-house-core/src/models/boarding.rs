//! Boarding rooms, bookings and health logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{days_between, total_price};

/// Boarding booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardingStatus {
    /// Submitted by the owner, awaiting approval
    Pending,
    /// Approved by staff
    Confirmed,
    /// Pet is on the premises
    CheckedIn,
    /// Pet has gone home
    Completed,
    /// Rejected or called off
    Cancelled,
}

impl BoardingStatus {
    pub const ALL: [BoardingStatus; 5] = [
        BoardingStatus::Pending,
        BoardingStatus::Confirmed,
        BoardingStatus::CheckedIn,
        BoardingStatus::Completed,
        BoardingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoardingStatus::Pending => "pending",
            BoardingStatus::Confirmed => "confirmed",
            BoardingStatus::CheckedIn => "checked_in",
            BoardingStatus::Completed => "completed",
            BoardingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BoardingStatus::Pending),
            "confirmed" => Some(BoardingStatus::Confirmed),
            "checked_in" => Some(BoardingStatus::CheckedIn),
            "completed" => Some(BoardingStatus::Completed),
            "cancelled" => Some(BoardingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BoardingStatus::Completed | BoardingStatus::Cancelled)
    }
}

impl std::fmt::Display for BoardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// Daily health assessment recorded by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Normal,
    MildIssue,
    SeriousIssue,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Normal => "normal",
            HealthStatus::MildIssue => "mild_issue",
            HealthStatus::SeriousIssue => "serious_issue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(HealthStatus::Normal),
            "mild_issue" => Some(HealthStatus::MildIssue),
            "serious_issue" => Some(HealthStatus::SeriousIssue),
            _ => None,
        }
    }
}

/// A boarding room.
///
/// `available_count` is informational. Bookings never decrement it and
/// overlapping stays are not checked against `capacity`; `is_available` is a
/// static flag an admin flips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardingRoom {
    pub id: String,
    pub name: String,
    /// Room category (e.g., "standard", "deluxe")
    pub room_type: Option<String>,
    pub capacity: u32,
    pub available_count: u32,
    pub price_per_day: f64,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl BoardingRoom {
    /// Create an available room.
    pub fn new(name: String, capacity: u32, price_per_day: f64) -> Self {
        let now = super::now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            room_type: None,
            capacity,
            available_count: capacity,
            price_per_day,
            is_available: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A boarding stay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardingBooking {
    pub id: String,
    pub pet_id: String,
    pub owner_id: String,
    pub room_id: String,
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    /// Room price snapshot at booking time
    pub price_per_day: f64,
    /// `price_per_day × max(1, days)`
    pub total_price: f64,
    pub status: BoardingStatus,
    pub payment_status: PaymentStatus,
    pub special_notes: Option<String>,
    pub dietary_requirements: Option<String>,
    pub medical_requirements: Option<String>,
    /// Staff member who checked the pet in
    pub staff_checked_in_by: Option<String>,
    /// Staff member who checked the pet out
    pub staff_checked_out_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BoardingBooking {
    /// Create a pending booking, snapshotting the room price and computing the total.
    pub fn new(
        pet_id: String,
        owner_id: String,
        room: &BoardingRoom,
        check_in_date: DateTime<Utc>,
        check_out_date: DateTime<Utc>,
    ) -> Self {
        let now = super::now_timestamp();
        let days = days_between(Some(check_in_date), Some(check_out_date));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id,
            owner_id,
            room_id: room.id.clone(),
            check_in_date,
            check_out_date,
            price_per_day: room.price_per_day,
            total_price: total_price(room.price_per_day, days),
            status: BoardingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            special_notes: None,
            dietary_requirements: None,
            medical_requirements: None,
            staff_checked_in_by: None,
            staff_checked_out_by: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Billable days for this stay.
    pub fn days(&self) -> i64 {
        days_between(Some(self.check_in_date), Some(self.check_out_date))
    }
}

/// Booking with one-hop joined display names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingView {
    pub booking: BoardingBooking,
    pub pet_name: Option<String>,
    pub pet_species: Option<String>,
    pub room_name: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

/// Append-only health entry for a boarding stay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardingHealthLog {
    pub id: String,
    pub booking_id: String,
    pub logged_by_staff_id: String,
    pub log_date: DateTime<Utc>,
    pub health_status: HealthStatus,
    pub behavior_notes: Option<String>,
    pub food_intake: Option<String>,
    pub water_intake: Option<String>,
    pub activities: Option<String>,
    pub medication_given: Option<String>,
    pub notes: Option<String>,
}

impl BoardingHealthLog {
    /// Start a log entry stamped now.
    pub fn new(booking_id: String, logged_by_staff_id: String, health_status: HealthStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id,
            logged_by_staff_id,
            log_date: Utc::now(),
            health_status,
            behavior_notes: None,
            food_intake: None,
            water_intake: None,
            activities: None,
            medication_given: None,
            notes: None,
        }
    }
}
