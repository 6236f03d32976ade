//! Profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Role, RoleCounts, UserProfile};

const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, phone, address, created_at, updated_at";

impl Database {
    /// Insert a new profile.
    pub fn insert_profile(&self, profile: &UserProfile) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO profiles (
                id, email, full_name, role, phone, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                profile.id,
                profile.email,
                profile.full_name,
                profile.role.as_str(),
                profile.phone,
                profile.address,
                profile.created_at,
                profile.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update contact details. Role changes are not supported.
    pub fn update_profile(&self, profile: &UserProfile) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE profiles SET
                full_name = ?2,
                phone = ?3,
                address = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                profile.id,
                profile.full_name,
                profile.phone,
                profile.address,
                crate::models::now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        self.conn
            .query_row(&sql, [id], ProfileRow::read)
            .optional()?
            .map(UserProfile::try_from)
            .transpose()
    }

    /// Get a profile by email.
    pub fn get_profile_by_email(&self, email: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ?");
        self.conn
            .query_row(&sql, [email], ProfileRow::read)
            .optional()?
            .map(UserProfile::try_from)
            .transpose()
    }

    /// List all profiles, newest first.
    pub fn list_profiles(&self) -> DbResult<Vec<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], ProfileRow::read)?;

        rows.map(|row| UserProfile::try_from(row?)).collect()
    }

    /// List profiles with the given role, by name.
    pub fn list_profiles_by_role(&self, role: Role) -> DbResult<Vec<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ? ORDER BY full_name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([role.as_str()], ProfileRow::read)?;

        rows.map(|row| UserProfile::try_from(row?)).collect()
    }

    /// Count profiles per role.
    pub fn role_counts(&self) -> DbResult<RoleCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT role, COUNT(*) FROM profiles GROUP BY role")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = RoleCounts::default();
        for row in rows {
            let (role, count) = row?;
            let count = count as usize;
            match string_to_role(&role)? {
                Role::Admin => counts.admins = count,
                Role::Staff => counts.staff = count,
                Role::Vet => counts.vets = count,
                Role::PetOwner => counts.pet_owners = count,
            }
        }
        Ok(counts)
    }

    /// Delete a profile. Pets, appointments and bookings cascade.
    pub fn delete_profile(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Raw profile row.
struct ProfileRow {
    id: String,
    email: String,
    full_name: String,
    role: String,
    phone: Option<String>,
    address: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: row.get(3)?,
            phone: row.get(4)?,
            address: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = DbError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: string_to_role(&row.role)?,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn string_to_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Constraint(format!("Unknown role: {}", s)))
}
