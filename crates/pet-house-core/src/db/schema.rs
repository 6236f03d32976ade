//! SQLite schema definition.

/// Complete database schema for pet-house.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Profiles & Pets
-- ============================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,                         -- auth service user id
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'pet_owner', 'vet', 'staff')),
    phone TEXT,
    address TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles(role);

CREATE TABLE IF NOT EXISTS pets (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT,
    age_years INTEGER,
    weight_kg REAL,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    owner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    vet_id TEXT REFERENCES profiles(id),          -- NULL only while pending
    start_time TEXT NOT NULL,
    end_time TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled', 'rejected')),
    service_type TEXT NOT NULL
        CHECK (service_type IN ('checkup', 'vaccination', 'grooming', 'boarding')),
    owner_note TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (end_time IS NULL OR end_time > start_time)
);

CREATE INDEX IF NOT EXISTS idx_appointments_owner ON appointments(owner_id);
CREATE INDEX IF NOT EXISTS idx_appointments_vet ON appointments(vet_id);
CREATE INDEX IF NOT EXISTS idx_appointments_status_start ON appointments(status, start_time);

-- Written once per appointment; inserting one completes the appointment
CREATE TABLE IF NOT EXISTS medical_records (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL UNIQUE REFERENCES appointments(id) ON DELETE CASCADE,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    vet_id TEXT NOT NULL,
    symptoms TEXT,
    diagnosis TEXT,
    treatment TEXT,
    prescription TEXT,
    doctor_notes TEXT,
    created_at TEXT NOT NULL
);

-- ============================================================================
-- Boarding
-- ============================================================================

CREATE TABLE IF NOT EXISTS boarding_rooms (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    room_type TEXT,
    capacity INTEGER NOT NULL CHECK (capacity >= 0),
    available_count INTEGER NOT NULL CHECK (available_count >= 0),
    price_per_day REAL NOT NULL CHECK (price_per_day >= 0),
    is_available INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS boarding_bookings (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    owner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    room_id TEXT NOT NULL REFERENCES boarding_rooms(id),
    check_in_date TEXT NOT NULL,
    check_out_date TEXT NOT NULL,
    price_per_day REAL NOT NULL,
    total_price REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'checked_in', 'completed', 'cancelled')),
    payment_status TEXT NOT NULL DEFAULT 'unpaid'
        CHECK (payment_status IN ('unpaid', 'paid')),
    special_notes TEXT,
    dietary_requirements TEXT,
    medical_requirements TEXT,
    staff_checked_in_by TEXT,
    staff_checked_out_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (check_out_date > check_in_date)
);

CREATE INDEX IF NOT EXISTS idx_bookings_owner ON boarding_bookings(owner_id);
CREATE INDEX IF NOT EXISTS idx_bookings_status ON boarding_bookings(status);
CREATE INDEX IF NOT EXISTS idx_bookings_room ON boarding_bookings(room_id);

-- Append-only
CREATE TABLE IF NOT EXISTS boarding_health_logs (
    id TEXT PRIMARY KEY,
    booking_id TEXT NOT NULL REFERENCES boarding_bookings(id) ON DELETE CASCADE,
    logged_by_staff_id TEXT NOT NULL,
    log_date TEXT NOT NULL,
    health_status TEXT NOT NULL DEFAULT 'normal'
        CHECK (health_status IN ('normal', 'mild_issue', 'serious_issue')),
    behavior_notes TEXT,
    food_intake TEXT,
    water_intake TEXT,
    activities TEXT,
    medication_given TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_health_logs_booking ON boarding_health_logs(booking_id, log_date);

CREATE TRIGGER IF NOT EXISTS boarding_health_logs_no_update BEFORE UPDATE ON boarding_health_logs
BEGIN
    SELECT RAISE(ABORT, 'Health logs are append-only');
END;

-- ============================================================================
-- Notifications
-- ============================================================================

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);

-- ============================================================================
-- Status Events (Append-Only hash chain)
-- ============================================================================

CREATE TABLE IF NOT EXISTS status_events (
    seq INTEGER PRIMARY KEY,
    entity_kind TEXT NOT NULL CHECK (entity_kind IN ('appointment', 'boarding_booking')),
    entity_id TEXT NOT NULL,
    payload TEXT NOT NULL,                       -- canonical JSON of the change
    prev_hash TEXT NOT NULL,
    hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_status_events_entity ON status_events(entity_kind, entity_id);

CREATE TRIGGER IF NOT EXISTS status_events_no_update BEFORE UPDATE ON status_events
BEGIN
    SELECT RAISE(ABORT, 'Status events are append-only');
END;

CREATE TRIGGER IF NOT EXISTS status_events_no_delete BEFORE DELETE ON status_events
BEGIN
    SELECT RAISE(ABORT, 'Status events are append-only');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_role_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO profiles (id, email, full_name, role, created_at, updated_at)
             VALUES ('u1', 'a@b.c', 'A', 'superuser', 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_booking_dates_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO profiles VALUES ('o1', 'o@x', 'Owner', 'pet_owner', NULL, NULL, 't', 't');
             INSERT INTO pets VALUES ('p1', 'o1', 'Rex', 'dog', NULL, NULL, NULL, NULL, 't', 't');
             INSERT INTO boarding_rooms VALUES ('r1', 'Suite', NULL, 2, 2, 40.0, 1, 't', 't');",
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO boarding_bookings (id, pet_id, owner_id, room_id, check_in_date,
                 check_out_date, price_per_day, total_price, created_at, updated_at)
             VALUES ('b1', 'p1', 'o1', 'r1', '2024-01-10', '2024-01-10', 40.0, 40.0, 't', 't')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_events_append_only() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO status_events (entity_kind, entity_id, payload, prev_hash, hash, created_at)
             VALUES ('appointment', 'a1', '{}', '', 'h1', 't')",
            [],
        )
        .unwrap();

        assert!(conn
            .execute("UPDATE status_events SET hash = 'h2'", [])
            .is_err());
        assert!(conn.execute("DELETE FROM status_events", []).is_err());
    }

    #[test]
    fn test_owner_delete_cascades_to_pets() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO profiles VALUES ('o1', 'o@x', 'Owner', 'pet_owner', NULL, NULL, 't', 't');
             INSERT INTO pets VALUES ('p1', 'o1', 'Rex', 'dog', NULL, NULL, NULL, NULL, 't', 't');
             DELETE FROM profiles WHERE id = 'o1';",
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
