//! Boarding analytics.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{BoardingBooking, BoardingStatus};

/// One slice of the status chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub status: BoardingStatus,
    pub count: usize,
}

/// Headline numbers for the boarding analytics page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardingAnalytics {
    pub total_bookings: usize,
    /// Sum of `total_price` over every booking, whatever its status
    pub total_revenue: f64,
    /// Non-zero statuses only, in lifecycle order
    pub status_counts: Vec<StatusSlice>,
}

impl BoardingAnalytics {
    /// Summarise a set of bookings.
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a BoardingBooking>) -> Self {
        let mut counts = [0usize; BoardingStatus::ALL.len()];
        let mut total_bookings = 0;
        let mut total_revenue = 0.0;

        for booking in bookings {
            total_bookings += 1;
            total_revenue += booking.total_price;
            if let Some(i) = BoardingStatus::ALL.iter().position(|s| *s == booking.status) {
                counts[i] += 1;
            }
        }

        let status_counts = BoardingStatus::ALL
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(status, count)| StatusSlice {
                status: *status,
                count,
            })
            .collect();

        Self {
            total_bookings,
            total_revenue,
            status_counts,
        }
    }

    /// Count for one status, zero when absent.
    pub fn count(&self, status: BoardingStatus) -> usize {
        self.status_counts
            .iter()
            .find(|slice| slice.status == status)
            .map_or(0, |slice| slice.count)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Analytics over every booking in the database.
pub fn boarding_analytics(db: &Database) -> DbResult<BoardingAnalytics> {
    let views = db.list_all_bookings()?;
    Ok(BoardingAnalytics::from_bookings(views.iter().map(|v| &v.booking)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoardingRoom;
    use chrono::{TimeZone, Utc};

    fn booking(status: BoardingStatus, nights: u32) -> BoardingBooking {
        let room = BoardingRoom::new("Suite".into(), 1, 40.0);
        let mut b = BoardingBooking::new(
            "pet".into(),
            "owner".into(),
            &room,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1 + nights, 0, 0, 0).unwrap(),
        );
        b.status = status;
        b
    }

    #[test]
    fn test_counts_and_revenue() {
        let bookings = vec![
            booking(BoardingStatus::Pending, 1),
            booking(BoardingStatus::Completed, 2),
            booking(BoardingStatus::Completed, 3),
            booking(BoardingStatus::Cancelled, 1),
        ];
        let analytics = BoardingAnalytics::from_bookings(&bookings);

        assert_eq!(analytics.total_bookings, 4);
        // Cancelled stays still count towards revenue
        assert_eq!(analytics.total_revenue, 40.0 + 80.0 + 120.0 + 40.0);
        assert_eq!(analytics.count(BoardingStatus::Completed), 2);
        assert_eq!(analytics.count(BoardingStatus::CheckedIn), 0);

        let shown: Vec<_> = analytics.status_counts.iter().map(|s| s.status).collect();
        assert_eq!(
            shown,
            vec![
                BoardingStatus::Pending,
                BoardingStatus::Completed,
                BoardingStatus::Cancelled
            ]
        );
    }

    #[test]
    fn test_empty() {
        let analytics = BoardingAnalytics::from_bookings(&Vec::<BoardingBooking>::new());
        assert_eq!(analytics.total_bookings, 0);
        assert_eq!(analytics.total_revenue, 0.0);
        assert!(analytics.status_counts.is_empty());
        assert!(analytics.to_json().unwrap().contains("\"total_bookings\": 0"));
    }
}
