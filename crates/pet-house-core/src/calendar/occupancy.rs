//! Day-bucketed occupancy views for month calendars.
//!
//! Records are grouped by the calendar day of their start instant in a
//! caller-supplied time zone. Bucketing by UTC date instead shifts evening
//! appointments to the next day for clinics east of Greenwich, so the zone is
//! always explicit.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Appointment, AppointmentView, BoardingBooking, BoardingStatus, BookingView,
};

/// Number of cells in a month grid (6 weeks × 7 days).
pub const GRID_CELLS: usize = 42;

/// Anything placed on the calendar by its start instant.
pub trait Scheduled {
    fn starts_at(&self) -> DateTime<Utc>;
}

impl Scheduled for Appointment {
    fn starts_at(&self) -> DateTime<Utc> {
        self.start_time
    }
}

impl Scheduled for AppointmentView {
    fn starts_at(&self) -> DateTime<Utc> {
        self.appointment.start_time
    }
}

impl Scheduled for BoardingBooking {
    fn starts_at(&self) -> DateTime<Utc> {
        self.check_in_date
    }
}

impl Scheduled for BookingView {
    fn starts_at(&self) -> DateTime<Utc> {
        self.booking.check_in_date
    }
}

/// Calendar day of an instant in `tz`.
pub fn local_day<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Stable `YYYY-MM-DD` key for a day.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Records grouped by local start day.
#[derive(Debug)]
pub struct DayBuckets<'a, T> {
    days: BTreeMap<NaiveDate, Vec<&'a T>>,
}

impl<'a, T: Scheduled> DayBuckets<'a, T> {
    /// Group `records` by the day they start on in `tz`. Input order is kept within a day.
    pub fn build<Tz: TimeZone>(records: &'a [T], tz: &Tz) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<&'a T>> = BTreeMap::new();
        for record in records {
            days.entry(local_day(&record.starts_at(), tz))
                .or_default()
                .push(record);
        }
        Self { days }
    }

    /// Number of records starting on `day`.
    pub fn count(&self, day: NaiveDate) -> usize {
        self.days.get(&day).map_or(0, Vec::len)
    }

    /// Counts keyed by `YYYY-MM-DD`, in date order. Days without records are absent.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.days
            .iter()
            .map(|(day, records)| (day_key(*day), records.len()))
            .collect()
    }

    /// Records starting on `day`.
    pub fn records_on(&self, day: NaiveDate) -> &[&'a T] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records for a `YYYY-MM-DD` key; unknown or malformed keys give an empty list.
    pub fn records_on_key(&self, key: &str) -> &[&'a T] {
        match NaiveDate::parse_from_str(key, "%Y-%m-%d") {
            Ok(day) => self.records_on(day),
            Err(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// One day cell of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for leading/trailing days of adjacent months (muted, still selectable)
    pub in_month: bool,
}

impl GridCell {
    pub fn key(&self) -> String {
        day_key(self.date)
    }
}

/// Fixed 42-cell grid starting on the Monday on or before the 1st of the month.
///
/// Returns `None` for an invalid year/month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<GridCell>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let lead = i64::from(first.weekday().num_days_from_monday());
    let start = first - Duration::days(lead);

    Some(
        (0..GRID_CELLS as i64)
            .map(|i| {
                let date = start + Duration::days(i);
                GridCell {
                    date,
                    in_month: date.year() == year && date.month() == month,
                }
            })
            .collect(),
    )
}

/// Move a month cursor by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Nightly occupancy of one room over a date window.
///
/// A stay occupies each night from its check-in day up to, not including, its
/// check-out day. This is a read-only view: nothing refuses a booking when a
/// night is full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOccupancy {
    pub room_id: String,
    pub capacity: u32,
    /// Occupied count per night, every night of the window present
    pub nights: BTreeMap<NaiveDate, u32>,
}

impl RoomOccupancy {
    /// Count confirmed and checked-in stays for `room_id` over `[from, to)`.
    pub fn build<'a>(
        room_id: &str,
        capacity: u32,
        bookings: impl IntoIterator<Item = &'a BoardingBooking>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        let mut nights: BTreeMap<NaiveDate, u32> = from
            .iter_days()
            .take_while(|day| *day < to)
            .map(|day| (day, 0))
            .collect();

        for booking in bookings {
            if booking.room_id != room_id
                || !matches!(
                    booking.status,
                    BoardingStatus::Confirmed | BoardingStatus::CheckedIn
                )
            {
                continue;
            }
            let check_in = booking.check_in_date.date_naive();
            let check_out = booking.check_out_date.date_naive();
            if check_out <= check_in {
                continue;
            }
            for (_, count) in nights.range_mut(check_in..check_out) {
                *count += 1;
            }
        }

        Self {
            room_id: room_id.to_string(),
            capacity,
            nights,
        }
    }

    /// Places left on `day`; 0 when the day is full or outside the window.
    pub fn remaining(&self, day: NaiveDate) -> u32 {
        self.nights
            .get(&day)
            .map_or(0, |used| self.capacity.saturating_sub(*used))
    }

    /// Nights where stays meet or exceed capacity.
    pub fn full_nights(&self) -> Vec<NaiveDate> {
        self.nights
            .iter()
            .filter(|(_, used)| **used >= self.capacity)
            .map(|(day, _)| *day)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardingRoom, ServiceType};
    use chrono::{FixedOffset, Weekday};

    fn appt_at(at: DateTime<Utc>) -> Appointment {
        Appointment::new(
            "pet".into(),
            "owner".into(),
            at,
            Duration::minutes(30),
            ServiceType::Checkup,
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_buckets_use_local_day() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let records = vec![
            // 18:00 UTC on the 9th is 01:00 on the 10th in UTC+7
            appt_at(Utc.with_ymd_and_hms(2024, 1, 9, 18, 0, 0).unwrap()),
            appt_at(Utc.with_ymd_and_hms(2024, 1, 10, 3, 0, 0).unwrap()),
            appt_at(Utc.with_ymd_and_hms(2024, 1, 11, 3, 0, 0).unwrap()),
        ];

        let local = DayBuckets::build(&records, &tz);
        assert_eq!(local.count(day(2024, 1, 10)), 2);
        assert_eq!(local.count(day(2024, 1, 9)), 0);
        assert_eq!(local.records_on_key("2024-01-10").len(), 2);

        let utc = DayBuckets::build(&records, &Utc);
        assert_eq!(utc.count(day(2024, 1, 9)), 1);
        assert_eq!(utc.count(day(2024, 1, 10)), 1);
    }

    #[test]
    fn test_counts_are_keyed_and_ordered() {
        let records = vec![
            appt_at(Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap()),
            appt_at(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()),
            appt_at(Utc.with_ymd_and_hms(2024, 2, 3, 15, 0, 0).unwrap()),
        ];
        let buckets = DayBuckets::build(&records, &Utc);
        let counts: Vec<_> = buckets.counts().into_iter().collect();
        assert_eq!(
            counts,
            vec![("2024-02-01".to_string(), 1), ("2024-02-03".to_string(), 2)]
        );
        assert!(buckets.records_on_key("garbage").is_empty());
        assert!(buckets.records_on(day(2024, 2, 2)).is_empty());
    }

    #[test]
    fn test_month_grid_shape() {
        // 2024-09-01 is a Sunday, so the grid starts Monday 2024-08-26.
        let grid = month_grid(2024, 9).unwrap();
        assert_eq!(grid.len(), GRID_CELLS);
        assert_eq!(grid[0].date, day(2024, 8, 26));
        assert_eq!(grid[0].date.weekday(), Weekday::Mon);
        assert!(!grid[0].in_month);
        assert_eq!(grid[6].key(), "2024-09-01");
        assert!(grid[6].in_month);
        assert_eq!(grid.iter().filter(|c| c.in_month).count(), 30);
        assert_eq!(grid[41].date, day(2024, 10, 6));
    }

    #[test]
    fn test_month_grid_starting_on_monday() {
        // 2024-01-01 is a Monday: no leading days.
        let grid = month_grid(2024, 1).unwrap();
        assert_eq!(grid[0].date, day(2024, 1, 1));
        assert!(grid[0].in_month);
        assert_eq!(grid.len(), 42);
    }

    #[test]
    fn test_month_grid_invalid_month() {
        assert!(month_grid(2024, 13).is_none());
        assert!(month_grid(2024, 0).is_none());
    }

    #[test]
    fn test_shift_month() {
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
        assert_eq!(shift_month(2024, 5, 14), (2025, 7));
    }

    #[test]
    fn test_room_occupancy() {
        let room = BoardingRoom::new("Suite".into(), 2, 40.0);
        let at = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap();

        let mut a = BoardingBooking::new("p1".into(), "o1".into(), &room, at(1), at(4));
        a.status = BoardingStatus::Confirmed;
        let mut b = BoardingBooking::new("p2".into(), "o2".into(), &room, at(3), at(5));
        b.status = BoardingStatus::CheckedIn;
        // Pending stays do not occupy a night.
        let c = BoardingBooking::new("p3".into(), "o3".into(), &room, at(1), at(6));

        let occ = RoomOccupancy::build(&room.id, room.capacity, [&a, &b, &c], day(2024, 3, 1), day(2024, 3, 6));
        assert_eq!(occ.nights.len(), 5);
        assert_eq!(occ.nights[&day(2024, 3, 1)], 1);
        assert_eq!(occ.nights[&day(2024, 3, 3)], 2);
        assert_eq!(occ.nights[&day(2024, 3, 4)], 1);
        assert_eq!(occ.nights[&day(2024, 3, 5)], 0);
        assert_eq!(occ.remaining(day(2024, 3, 3)), 0);
        assert_eq!(occ.remaining(day(2024, 3, 5)), 2);
        assert_eq!(occ.remaining(day(2024, 4, 1)), 0);
        assert_eq!(occ.full_nights(), vec![day(2024, 3, 3)]);
    }
}
