//! Boarding room, booking and health log database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{column_instant, Database, DbError, DbResult};
use crate::models::{
    timestamp, BoardingBooking, BoardingHealthLog, BoardingRoom, BoardingStatus, BookingView,
    HealthStatus, PaymentStatus,
};

const ROOM_COLUMNS: &str = "id, name, room_type, capacity, available_count, price_per_day, \
                            is_available, created_at, updated_at";

const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.pet_id, b.owner_id, b.room_id, b.check_in_date, b.check_out_date,
           b.price_per_day, b.total_price, b.status, b.payment_status, b.special_notes,
           b.dietary_requirements, b.medical_requirements, b.staff_checked_in_by,
           b.staff_checked_out_by, b.created_at, b.updated_at,
           p.name, p.species, r.name, o.full_name, o.email
    FROM boarding_bookings b
    LEFT JOIN pets p ON p.id = b.pet_id
    LEFT JOIN boarding_rooms r ON r.id = b.room_id
    LEFT JOIN profiles o ON o.id = b.owner_id
"#;

const HEALTH_LOG_COLUMNS: &str = "id, booking_id, logged_by_staff_id, log_date, health_status, \
                                  behavior_notes, food_intake, water_intake, activities, \
                                  medication_given, notes";

impl Database {
    // ------------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------------

    /// Insert a new room.
    pub fn insert_room(&self, room: &BoardingRoom) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO boarding_rooms (
                id, name, room_type, capacity, available_count, price_per_day,
                is_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                room.id,
                room.name,
                room.room_type,
                room.capacity,
                room.available_count,
                room.price_per_day,
                room.is_available,
                room.created_at,
                room.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a room by ID.
    pub fn get_room(&self, id: &str) -> DbResult<Option<BoardingRoom>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM boarding_rooms WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_room)
            .optional()
            .map_err(Into::into)
    }

    /// List rooms, by name. `only_available` keeps rooms flagged available.
    pub fn list_rooms(&self, only_available: bool) -> DbResult<Vec<BoardingRoom>> {
        let filter = if only_available {
            "WHERE is_available = 1"
        } else {
            ""
        };
        let sql = format!("SELECT {ROOM_COLUMNS} FROM boarding_rooms {filter} ORDER BY name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_room)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Flip the admin availability flag.
    pub fn set_room_availability(&self, id: &str, is_available: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE boarding_rooms SET is_available = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_available, crate::models::now_timestamp(), id],
        )?;
        Ok(rows_affected > 0)
    }

    // ------------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------------

    /// Insert a new booking.
    pub fn insert_booking(&self, booking: &BoardingBooking) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO boarding_bookings (
                id, pet_id, owner_id, room_id, check_in_date, check_out_date,
                price_per_day, total_price, status, payment_status, special_notes,
                dietary_requirements, medical_requirements, staff_checked_in_by,
                staff_checked_out_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                booking.id,
                booking.pet_id,
                booking.owner_id,
                booking.room_id,
                timestamp(&booking.check_in_date),
                timestamp(&booking.check_out_date),
                booking.price_per_day,
                booking.total_price,
                booking.status.as_str(),
                booking.payment_status.as_str(),
                booking.special_notes,
                booking.dietary_requirements,
                booking.medical_requirements,
                booking.staff_checked_in_by,
                booking.staff_checked_out_by,
                booking.created_at,
                booking.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a booking by ID.
    pub fn get_booking(&self, id: &str) -> DbResult<Option<BoardingBooking>> {
        self.get_booking_view(id).map(|view| view.map(|v| v.booking))
    }

    /// Get a booking with its display names.
    pub fn get_booking_view(&self, id: &str) -> DbResult<Option<BookingView>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.id = ?");
        self.conn
            .query_row(&sql, [id], BookingRow::read)
            .optional()?
            .map(BookingView::try_from)
            .transpose()
    }

    /// Move a booking from `from` to `to` if it is still in `from`.
    pub fn set_booking_status(
        &self,
        id: &str,
        from: BoardingStatus,
        to: BoardingStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE boarding_bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), timestamp(&now), id, from.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// `confirmed → checked_in`, recording who checked the pet in.
    pub fn check_in_booking(&self, id: &str, staff_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE boarding_bookings
            SET status = 'checked_in', staff_checked_in_by = ?1, updated_at = ?2
            WHERE id = ?3 AND status = 'confirmed'
            "#,
            params![staff_id, timestamp(&now), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// `checked_in → completed`, recording who checked the pet out.
    pub fn check_out_booking(&self, id: &str, staff_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE boarding_bookings
            SET status = 'completed', staff_checked_out_by = ?1, updated_at = ?2
            WHERE id = ?3 AND status = 'checked_in'
            "#,
            params![staff_id, timestamp(&now), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark an unpaid stay paid. Only stays that have started are billable.
    pub fn mark_booking_paid(&self, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE boarding_bookings SET payment_status = 'paid', updated_at = ?1
            WHERE id = ?2 AND payment_status = 'unpaid'
              AND status IN ('checked_in', 'completed')
            "#,
            params![timestamp(&now), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// An owner's bookings, newest first.
    pub fn list_owner_bookings(&self, owner_id: &str) -> DbResult<Vec<BookingView>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.owner_id = ? ORDER BY b.created_at DESC");
        self.query_bookings(&sql, vec![owner_id.to_string()])
    }

    /// Bookings in any of `statuses`, by check-in date.
    pub fn list_bookings_by_status(&self, statuses: &[BoardingStatus]) -> DbResult<Vec<BookingView>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "{BOOKING_SELECT} WHERE b.status IN ({placeholders}) ORDER BY b.check_in_date ASC"
        );
        let values = statuses.iter().map(|s| s.as_str().to_string()).collect();
        self.query_bookings(&sql, values)
    }

    /// Every booking, newest first.
    pub fn list_all_bookings(&self) -> DbResult<Vec<BookingView>> {
        let sql = format!("{BOOKING_SELECT} ORDER BY b.created_at DESC");
        self.query_bookings(&sql, Vec::new())
    }

    /// Bookings for one room whose stay overlaps `[from, to)`.
    pub fn list_room_bookings(
        &self,
        room_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<BookingView>> {
        let sql = format!(
            "{BOOKING_SELECT} WHERE b.room_id = ? AND b.check_in_date < ? AND b.check_out_date > ? \
             ORDER BY b.check_in_date ASC"
        );
        self.query_bookings(&sql, vec![room_id.to_string(), timestamp(&to), timestamp(&from)])
    }

    fn query_bookings(&self, sql: &str, values: Vec<String>) -> DbResult<Vec<BookingView>> {
        tracing::debug!(sql = %sql, params = values.len(), "booking query");
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), BookingRow::read)?;

        rows.map(|row| BookingView::try_from(row?)).collect()
    }

    // ------------------------------------------------------------------------
    // Health logs
    // ------------------------------------------------------------------------

    /// Append a health log entry.
    pub fn insert_health_log(&self, log: &BoardingHealthLog) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO boarding_health_logs (
                id, booking_id, logged_by_staff_id, log_date, health_status,
                behavior_notes, food_intake, water_intake, activities,
                medication_given, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                log.id,
                log.booking_id,
                log.logged_by_staff_id,
                timestamp(&log.log_date),
                log.health_status.as_str(),
                log.behavior_notes,
                log.food_intake,
                log.water_intake,
                log.activities,
                log.medication_given,
                log.notes,
            ],
        )?;
        Ok(())
    }

    /// Health logs for a booking, newest first.
    pub fn list_health_logs(&self, booking_id: &str) -> DbResult<Vec<BoardingHealthLog>> {
        let sql = format!(
            "SELECT {HEALTH_LOG_COLUMNS} FROM boarding_health_logs \
             WHERE booking_id = ? ORDER BY log_date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([booking_id], HealthLogRow::read)?;

        rows.map(|row| BoardingHealthLog::try_from(row?)).collect()
    }
}

fn read_room(row: &Row<'_>) -> rusqlite::Result<BoardingRoom> {
    Ok(BoardingRoom {
        id: row.get(0)?,
        name: row.get(1)?,
        room_type: row.get(2)?,
        capacity: row.get(3)?,
        available_count: row.get(4)?,
        price_per_day: row.get(5)?,
        is_available: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Raw booking row plus joined names.
struct BookingRow {
    id: String,
    pet_id: String,
    owner_id: String,
    room_id: String,
    check_in_date: String,
    check_out_date: String,
    price_per_day: f64,
    total_price: f64,
    status: String,
    payment_status: String,
    special_notes: Option<String>,
    dietary_requirements: Option<String>,
    medical_requirements: Option<String>,
    staff_checked_in_by: Option<String>,
    staff_checked_out_by: Option<String>,
    created_at: String,
    updated_at: String,
    pet_name: Option<String>,
    pet_species: Option<String>,
    room_name: Option<String>,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

impl BookingRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pet_id: row.get(1)?,
            owner_id: row.get(2)?,
            room_id: row.get(3)?,
            check_in_date: row.get(4)?,
            check_out_date: row.get(5)?,
            price_per_day: row.get(6)?,
            total_price: row.get(7)?,
            status: row.get(8)?,
            payment_status: row.get(9)?,
            special_notes: row.get(10)?,
            dietary_requirements: row.get(11)?,
            medical_requirements: row.get(12)?,
            staff_checked_in_by: row.get(13)?,
            staff_checked_out_by: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
            pet_name: row.get(17)?,
            pet_species: row.get(18)?,
            room_name: row.get(19)?,
            owner_name: row.get(20)?,
            owner_email: row.get(21)?,
        })
    }
}

impl TryFrom<BookingRow> for BookingView {
    type Error = DbError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BoardingStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown boarding status: {}", row.status))
        })?;
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown payment status: {}", row.payment_status))
        })?;

        Ok(BookingView {
            booking: BoardingBooking {
                id: row.id,
                pet_id: row.pet_id,
                owner_id: row.owner_id,
                room_id: row.room_id,
                check_in_date: column_instant(&row.check_in_date)?,
                check_out_date: column_instant(&row.check_out_date)?,
                price_per_day: row.price_per_day,
                total_price: row.total_price,
                status,
                payment_status,
                special_notes: row.special_notes,
                dietary_requirements: row.dietary_requirements,
                medical_requirements: row.medical_requirements,
                staff_checked_in_by: row.staff_checked_in_by,
                staff_checked_out_by: row.staff_checked_out_by,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            pet_name: row.pet_name,
            pet_species: row.pet_species,
            room_name: row.room_name,
            owner_name: row.owner_name,
            owner_email: row.owner_email,
        })
    }
}

/// Raw health log row.
struct HealthLogRow {
    id: String,
    booking_id: String,
    logged_by_staff_id: String,
    log_date: String,
    health_status: String,
    behavior_notes: Option<String>,
    food_intake: Option<String>,
    water_intake: Option<String>,
    activities: Option<String>,
    medication_given: Option<String>,
    notes: Option<String>,
}

impl HealthLogRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            logged_by_staff_id: row.get(2)?,
            log_date: row.get(3)?,
            health_status: row.get(4)?,
            behavior_notes: row.get(5)?,
            food_intake: row.get(6)?,
            water_intake: row.get(7)?,
            activities: row.get(8)?,
            medication_given: row.get(9)?,
            notes: row.get(10)?,
        })
    }
}

impl TryFrom<HealthLogRow> for BoardingHealthLog {
    type Error = DbError;

    fn try_from(row: HealthLogRow) -> Result<Self, Self::Error> {
        let health_status = HealthStatus::parse(&row.health_status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown health status: {}", row.health_status))
        })?;

        Ok(BoardingHealthLog {
            id: row.id,
            booking_id: row.booking_id,
            logged_by_staff_id: row.logged_by_staff_id,
            log_date: column_instant(&row.log_date)?,
            health_status,
            behavior_notes: row.behavior_notes,
            food_intake: row.food_intake,
            water_intake: row.water_intake,
            activities: row.activities,
            medication_given: row.medication_given,
            notes: row.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pet, Role, UserProfile};
    use chrono::TimeZone;

    struct Fixture {
        db: Database,
        pet: Pet,
        room: BoardingRoom,
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        db.insert_profile(&UserProfile::new(
            "owner-1".into(),
            "owner@pethouse.test".into(),
            "Olive Owner".into(),
            Role::PetOwner,
        ))
        .unwrap();
        let pet = Pet::new("owner-1".into(), "Rex".into(), "dog".into());
        db.insert_pet(&pet).unwrap();
        let room = BoardingRoom::new("Garden Suite".into(), 2, 45.0);
        db.insert_room(&room).unwrap();
        Fixture { db, pet, room }
    }

    fn booking(fx: &Fixture, check_in: u32, check_out: u32) -> BoardingBooking {
        let booking = BoardingBooking::new(
            fx.pet.id.clone(),
            "owner-1".into(),
            &fx.room,
            day(check_in),
            day(check_out),
        );
        fx.db.insert_booking(&booking).unwrap();
        booking
    }

    #[test]
    fn test_rooms() {
        let fx = setup();
        let closed = BoardingRoom::new("Annex".into(), 1, 30.0);
        fx.db.insert_room(&closed).unwrap();
        fx.db.set_room_availability(&closed.id, false).unwrap();

        assert_eq!(fx.db.list_rooms(false).unwrap().len(), 2);
        let open = fx.db.list_rooms(true).unwrap();
        assert_eq!(open, vec![fx.room.clone()]);
        assert!(!fx.db.get_room(&closed.id).unwrap().unwrap().is_available);
    }

    #[test]
    fn test_insert_and_get_view() {
        let fx = setup();
        let b = booking(&fx, 10, 15);
        assert_eq!(b.total_price, 225.0);

        let view = fx.db.get_booking_view(&b.id).unwrap().unwrap();
        assert_eq!(view.booking, b);
        assert_eq!(view.pet_name.as_deref(), Some("Rex"));
        assert_eq!(view.room_name.as_deref(), Some("Garden Suite"));
        assert_eq!(view.owner_email.as_deref(), Some("owner@pethouse.test"));
    }

    #[test]
    fn test_guarded_lifecycle() {
        let fx = setup();
        let b = booking(&fx, 10, 15);
        let now = day(9);

        // Cannot check in before approval
        assert!(!fx.db.check_in_booking(&b.id, "staff-1", now).unwrap());
        assert!(fx
            .db
            .set_booking_status(&b.id, BoardingStatus::Pending, BoardingStatus::Confirmed, now)
            .unwrap());
        assert!(!fx.db.check_out_booking(&b.id, "staff-1", now).unwrap());
        assert!(fx.db.check_in_booking(&b.id, "staff-1", now).unwrap());
        assert!(fx.db.check_out_booking(&b.id, "staff-2", now).unwrap());

        let stored = fx.db.get_booking(&b.id).unwrap().unwrap();
        assert_eq!(stored.status, BoardingStatus::Completed);
        assert_eq!(stored.staff_checked_in_by.as_deref(), Some("staff-1"));
        assert_eq!(stored.staff_checked_out_by.as_deref(), Some("staff-2"));
    }

    #[test]
    fn test_mark_paid_only_after_check_in() {
        let fx = setup();
        let b = booking(&fx, 10, 12);
        let now = day(9);

        assert!(!fx.db.mark_booking_paid(&b.id, now).unwrap());
        fx.db
            .set_booking_status(&b.id, BoardingStatus::Pending, BoardingStatus::Confirmed, now)
            .unwrap();
        fx.db.check_in_booking(&b.id, "staff-1", now).unwrap();
        assert!(fx.db.mark_booking_paid(&b.id, now).unwrap());
        assert!(!fx.db.mark_booking_paid(&b.id, now).unwrap());

        let stored = fx.db.get_booking(&b.id).unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_list_by_status_and_room() {
        let fx = setup();
        let a = booking(&fx, 10, 12);
        let b = booking(&fx, 5, 8);
        let c = booking(&fx, 20, 22);
        fx.db
            .set_booking_status(&c.id, BoardingStatus::Pending, BoardingStatus::Cancelled, day(1))
            .unwrap();

        let pending = fx.db.list_bookings_by_status(&[BoardingStatus::Pending]).unwrap();
        let ids: Vec<_> = pending.iter().map(|v| v.booking.id.clone()).collect();
        assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);

        assert!(fx.db.list_bookings_by_status(&[]).unwrap().is_empty());
        assert_eq!(fx.db.list_owner_bookings("owner-1").unwrap().len(), 3);
        assert_eq!(fx.db.list_all_bookings().unwrap().len(), 3);

        let overlapping = fx.db.list_room_bookings(&fx.room.id, day(7), day(11)).unwrap();
        assert_eq!(overlapping.len(), 2);
    }

    #[test]
    fn test_health_logs_append_only() {
        let fx = setup();
        let b = booking(&fx, 10, 12);

        let mut first = BoardingHealthLog::new(b.id.clone(), "staff-1".into(), HealthStatus::Normal);
        first.log_date = day(10);
        first.food_intake = Some("Ate everything".into());
        let mut second = BoardingHealthLog::new(b.id.clone(), "staff-1".into(), HealthStatus::MildIssue);
        second.log_date = day(11);
        fx.db.insert_health_log(&first).unwrap();
        fx.db.insert_health_log(&second).unwrap();

        let logs = fx.db.list_health_logs(&b.id).unwrap();
        assert_eq!(logs, vec![second, first]);

        let update = fx
            .db
            .conn()
            .execute("UPDATE boarding_health_logs SET notes = 'edited'", []);
        assert!(update.is_err());
    }
}
