//! Medical record database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{timestamp, MedicalRecord};

const RECORD_COLUMNS: &str = "id, appointment_id, pet_id, vet_id, symptoms, diagnosis, \
                              treatment, prescription, doctor_notes, created_at";

impl Database {
    /// Write the record and complete its appointment in one transaction.
    ///
    /// The appointment must still be `confirmed` and pinned to the record's
    /// vet. Returns `false` (and writes nothing) when it is not.
    pub fn complete_with_record(&self, record: &MedicalRecord, now: DateTime<Utc>) -> DbResult<bool> {
        self.atomically(|| -> DbResult<bool> {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE appointments SET status = 'completed', updated_at = ?1
                WHERE id = ?2 AND vet_id = ?3 AND pet_id = ?4 AND status = 'confirmed'
                "#,
                params![timestamp(&now), record.appointment_id, record.vet_id, record.pet_id],
            )?;
            if rows_affected == 0 {
                return Ok(false);
            }

            self.conn.execute(
                r#"
                INSERT INTO medical_records (
                    id, appointment_id, pet_id, vet_id, symptoms, diagnosis,
                    treatment, prescription, doctor_notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    record.id,
                    record.appointment_id,
                    record.pet_id,
                    record.vet_id,
                    record.symptoms,
                    record.diagnosis,
                    record.treatment,
                    record.prescription,
                    record.doctor_notes,
                    record.created_at,
                ],
            )?;

            Ok(true)
        })
    }

    /// Get the record written for an appointment.
    pub fn get_medical_record(&self, appointment_id: &str) -> DbResult<Option<MedicalRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM medical_records WHERE appointment_id = ?");
        self.conn
            .query_row(&sql, [appointment_id], read_record)
            .optional()
            .map_err(Into::into)
    }

    /// A pet's medical history, newest first.
    pub fn list_medical_records_for_pet(&self, pet_id: &str) -> DbResult<Vec<MedicalRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM medical_records WHERE pet_id = ? ORDER BY created_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([pet_id], read_record)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        pet_id: row.get(2)?,
        vet_id: row.get(3)?,
        symptoms: row.get(4)?,
        diagnosis: row.get(5)?,
        treatment: row.get(6)?,
        prescription: row.get(7)?,
        doctor_notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Appointment, AppointmentStatus, MedicalRecordInput, Pet, Role, ServiceType, UserProfile,
    };
    use chrono::{Duration, TimeZone};

    fn setup() -> (Database, Appointment) {
        let db = Database::open_in_memory().unwrap();
        for (id, role) in [("owner-1", Role::PetOwner), ("vet-1", Role::Vet)] {
            db.insert_profile(&UserProfile::new(id.into(), format!("{id}@x"), id.into(), role))
                .unwrap();
        }
        let pet = Pet::new("owner-1".into(), "Rex".into(), "dog".into());
        db.insert_pet(&pet).unwrap();
        let appt = Appointment::new(
            pet.id.clone(),
            "owner-1".into(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            Duration::minutes(30),
            ServiceType::Checkup,
        );
        db.insert_appointment(&appt).unwrap();
        (db, appt)
    }

    fn record(appt: &Appointment, vet_id: &str) -> MedicalRecord {
        MedicalRecord::new(
            appt.id.clone(),
            appt.pet_id.clone(),
            vet_id.into(),
            MedicalRecordInput {
                diagnosis: Some("Healthy".into()),
                ..MedicalRecordInput::default()
            },
        )
    }

    #[test]
    fn test_requires_confirmed_appointment() {
        let (db, appt) = setup();

        assert!(!db.complete_with_record(&record(&appt, "vet-1"), Utc::now()).unwrap());
        assert!(db.get_medical_record(&appt.id).unwrap().is_none());
    }

    #[test]
    fn test_complete_and_read_back() {
        let (db, appt) = setup();
        db.claim_appointment(&appt.id, "vet-1", Utc::now()).unwrap();

        let rec = record(&appt, "vet-1");
        assert!(db.complete_with_record(&rec, Utc::now()).unwrap());

        let stored = db.get_appointment(&appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
        assert_eq!(db.get_medical_record(&appt.id).unwrap(), Some(rec.clone()));
        assert_eq!(db.list_medical_records_for_pet(&appt.pet_id).unwrap(), vec![rec]);
    }

    #[test]
    fn test_other_vet_cannot_complete() {
        let (db, appt) = setup();
        db.claim_appointment(&appt.id, "vet-1", Utc::now()).unwrap();

        assert!(!db.complete_with_record(&record(&appt, "vet-2"), Utc::now()).unwrap());
        let stored = db.get_appointment(&appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn test_second_record_rejected() {
        let (db, appt) = setup();
        db.claim_appointment(&appt.id, "vet-1", Utc::now()).unwrap();
        assert!(db.complete_with_record(&record(&appt, "vet-1"), Utc::now()).unwrap());

        // Appointment is no longer confirmed, so nothing is written
        assert!(!db.complete_with_record(&record(&appt, "vet-1"), Utc::now()).unwrap());
    }
}
