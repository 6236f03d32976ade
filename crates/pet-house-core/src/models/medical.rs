//! Medical records.

use serde::{Deserialize, Serialize};

/// Clinical notes written by the vet when closing an appointment.
///
/// One per appointment. Persisting it is what marks the appointment completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: String,
    pub appointment_id: String,
    pub pet_id: String,
    pub vet_id: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub doctor_notes: Option<String>,
    pub created_at: String,
}

/// Form contents for a new medical record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecordInput {
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub doctor_notes: Option<String>,
}

impl MedicalRecord {
    /// Build a record for an appointment from form input.
    pub fn new(appointment_id: String, pet_id: String, vet_id: String, input: MedicalRecordInput) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id,
            pet_id,
            vet_id,
            symptoms: input.symptoms,
            diagnosis: input.diagnosis,
            treatment: input.treatment,
            prescription: input.prescription,
            doctor_notes: input.doctor_notes,
            created_at: super::now_timestamp(),
        }
    }
}
