//! Pet database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Pet;

const PET_COLUMNS: &str =
    "id, owner_id, name, species, breed, age_years, weight_kg, notes, created_at, updated_at";

impl Database {
    /// Insert a new pet.
    pub fn insert_pet(&self, pet: &Pet) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pets (
                id, owner_id, name, species, breed, age_years, weight_kg,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                pet.id,
                pet.owner_id,
                pet.name,
                pet.species,
                pet.breed,
                pet.age_years,
                pet.weight_kg,
                pet.notes,
                pet.created_at,
                pet.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing pet. The owner never changes.
    pub fn update_pet(&self, pet: &Pet) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE pets SET
                name = ?3,
                species = ?4,
                breed = ?5,
                age_years = ?6,
                weight_kg = ?7,
                notes = ?8,
                updated_at = ?9
            WHERE id = ?1 AND owner_id = ?2
            "#,
            params![
                pet.id,
                pet.owner_id,
                pet.name,
                pet.species,
                pet.breed,
                pet.age_years,
                pet.weight_kg,
                pet.notes,
                crate::models::now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, id: &str) -> DbResult<Option<Pet>> {
        let sql = format!("SELECT {PET_COLUMNS} FROM pets WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_pet)
            .optional()
            .map_err(Into::into)
    }

    /// List an owner's pets by name.
    pub fn list_pets_for_owner(&self, owner_id: &str) -> DbResult<Vec<Pet>> {
        let sql = format!("SELECT {PET_COLUMNS} FROM pets WHERE owner_id = ? ORDER BY name");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([owner_id], read_pet)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a pet owned by `owner_id`.
    pub fn delete_pet(&self, id: &str, owner_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM pets WHERE id = ? AND owner_id = ?",
            [id, owner_id],
        )?;
        Ok(rows_affected > 0)
    }
}

fn read_pet(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        age_years: row.get(5)?,
        weight_kg: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
