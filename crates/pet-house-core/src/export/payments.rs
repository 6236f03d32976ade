//! Payments ledger for admins.
//!
//! Only stays that have started (`checked_in` or `completed`) are billable.

use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::db::{Database, DbResult};
use crate::models::{timestamp, BoardingStatus, BookingView, PaymentStatus};

/// Which payment states to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl PaymentFilter {
    fn matches(self, status: PaymentStatus) -> bool {
        match self {
            PaymentFilter::All => true,
            PaymentFilter::Paid => status == PaymentStatus::Paid,
            PaymentFilter::Unpaid => status == PaymentStatus::Unpaid,
        }
    }
}

/// One billable stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub booking_id: String,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub pet_name: Option<String>,
    pub check_in_date: String,
    pub check_out_date: String,
    pub total_price: f64,
    pub status: BoardingStatus,
    pub payment_status: PaymentStatus,
}

impl From<&BookingView> for PaymentRow {
    fn from(view: &BookingView) -> Self {
        let b = &view.booking;
        Self {
            booking_id: b.id.clone(),
            owner_name: view.owner_name.clone(),
            owner_email: view.owner_email.clone(),
            pet_name: view.pet_name.clone(),
            check_in_date: timestamp(&b.check_in_date),
            check_out_date: timestamp(&b.check_out_date),
            total_price: b.total_price,
            status: b.status,
            payment_status: b.payment_status,
        }
    }
}

/// Payments page contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsReport {
    /// Export timestamp
    pub exported_at: String,
    pub rows: Vec<PaymentRow>,
    /// Sum over paid rows of the whole ledger, unaffected by filters
    pub paid_revenue: f64,
}

impl PaymentsReport {
    /// Build from billable bookings, applying the payment filter and a
    /// case-insensitive search over owner name, pet name and booking id.
    pub fn build(views: &[BookingView], filter: PaymentFilter, search: &str) -> Self {
        let billable: Vec<&BookingView> = views
            .iter()
            .filter(|v| {
                matches!(
                    v.booking.status,
                    BoardingStatus::CheckedIn | BoardingStatus::Completed
                )
            })
            .collect();

        let paid_revenue = billable
            .iter()
            .filter(|v| v.booking.payment_status == PaymentStatus::Paid)
            .map(|v| v.booking.total_price)
            .sum();

        let needle = search.trim().to_lowercase();
        let rows = billable
            .into_iter()
            .filter(|v| filter.matches(v.booking.payment_status))
            .filter(|v| needle.is_empty() || matches_search(v, &needle))
            .map(PaymentRow::from)
            .collect();

        Self {
            exported_at: crate::models::now_timestamp(),
            rows,
            paid_revenue,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("booking_id,owner_name,owner_email,pet_name,check_in_date,check_out_date,total_price,status,payment_status\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{:.2},{},{}\n",
                escape_csv(&row.booking_id),
                escape_csv(row.owner_name.as_deref().unwrap_or("")),
                escape_csv(row.owner_email.as_deref().unwrap_or("")),
                escape_csv(row.pet_name.as_deref().unwrap_or("")),
                row.check_in_date,
                row.check_out_date,
                row.total_price,
                row.status.as_str(),
                row.payment_status.as_str(),
            ));
        }

        csv
    }
}

fn matches_search(view: &BookingView, needle: &str) -> bool {
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
    };
    contains(&view.owner_name) || contains(&view.pet_name) || view.booking.id.contains(needle)
}

/// Payments exporter.
pub struct PaymentsExporter<'a> {
    db: &'a Database,
}

impl<'a> PaymentsExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Build the report from the database.
    pub fn report(&self, filter: PaymentFilter, search: &str) -> DbResult<PaymentsReport> {
        let views = self
            .db
            .list_bookings_by_status(&[BoardingStatus::CheckedIn, BoardingStatus::Completed])?;
        Ok(PaymentsReport::build(&views, filter, search))
    }
}
