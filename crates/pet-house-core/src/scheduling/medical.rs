//! Closing appointments with a medical record.

use chrono::{DateTime, Utc};

use super::{name_or, notify, ScheduleError, ScheduleResult};
use crate::audit::AuditTrail;
use crate::db::Database;
use crate::lifecycle::{check_appointment_transition, Actor, AppointmentAction};
use crate::models::{EntityKind, MedicalRecord, MedicalRecordInput, StatusChange};

/// Medical record service.
pub struct MedicalRecordService<'a> {
    db: &'a Database,
}

impl<'a> MedicalRecordService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Write the record for a confirmed appointment, completing it.
    ///
    /// Only the vet pinned on the appointment may do this. The record insert,
    /// the status change and its audit event commit together.
    pub fn complete(
        &self,
        actor: &Actor,
        appointment_id: &str,
        input: MedicalRecordInput,
        now: DateTime<Utc>,
    ) -> ScheduleResult<MedicalRecord> {
        let view = self
            .db
            .get_appointment_view(appointment_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Appointment {appointment_id}")))?;
        let appt = &view.appointment;
        check_appointment_transition(appt, actor, AppointmentAction::Complete, now).map_err(|e| {
            tracing::warn!(appointment_id, actor_id = %actor.id, error = %e, "completion denied");
            e
        })?;

        let record = MedicalRecord::new(
            appt.id.clone(),
            appt.pet_id.clone(),
            actor.id.clone(),
            input,
        );
        self.db.atomically(|| -> ScheduleResult<_> {
            if !self.db.complete_with_record(&record, now)? {
                return Err(ScheduleError::StaleState(format!("Appointment {appointment_id}")));
            }
            AuditTrail::new(self.db).record(StatusChange::new(
                EntityKind::Appointment,
                appointment_id,
                Some(appt.status.as_str()),
                AppointmentAction::Complete.target().as_str(),
                &actor.id,
            ))?;
            Ok(())
        })?;
        tracing::info!(appointment_id, vet_id = %actor.id, record_id = %record.id, "appointment completed");

        notify(
            self.db,
            &appt.owner_id,
            "Visit completed",
            format!(
                "{}'s medical record from the {} is ready.",
                name_or(&view.pet_name, "Your pet"),
                appt.service_type.as_str()
            ),
        );
        Ok(record)
    }

    /// Read back the record for an appointment.
    ///
    /// Visible to the owner, the assigned vet, staff and admins.
    pub fn get(&self, actor: &Actor, appointment_id: &str) -> ScheduleResult<Option<MedicalRecord>> {
        let appt = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Appointment {appointment_id}")))?;
        let allowed = actor.role.is_staff_or_admin()
            || appt.owner_id == actor.id
            || appt.vet_id.as_deref() == Some(actor.id.as_str());
        if !allowed {
            return Err(ScheduleError::Forbidden("not your appointment".into()));
        }
        Ok(self.db.get_medical_record(appointment_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentStatus, Pet, Role, ServiceType, UserProfile};
    use crate::lifecycle::TransitionError;
    use chrono::Duration;

    fn setup() -> (Database, Appointment) {
        let db = Database::open_in_memory().unwrap();
        for (id, role) in [("owner-1", Role::PetOwner), ("vet-1", Role::Vet), ("vet-2", Role::Vet)] {
            db.insert_profile(&UserProfile::new(id.into(), format!("{id}@x"), id.into(), role))
                .unwrap();
        }
        let pet = Pet::new("owner-1".into(), "Rex".into(), "dog".into());
        db.insert_pet(&pet).unwrap();
        let appt = Appointment::new(
            pet.id,
            "owner-1".into(),
            Utc::now() + Duration::hours(1),
            Duration::minutes(30),
            ServiceType::Checkup,
        );
        db.insert_appointment(&appt).unwrap();
        (db, appt)
    }

    fn input() -> MedicalRecordInput {
        MedicalRecordInput {
            symptoms: Some("Limping".into()),
            diagnosis: Some("Sprain".into()),
            treatment: Some("Rest".into()),
            ..MedicalRecordInput::default()
        }
    }

    #[test]
    fn test_complete_requires_confirmed() {
        let (db, appt) = setup();
        let service = MedicalRecordService::new(&db);
        let vet = Actor::new("vet-1", Role::Vet);

        // Still pending and unassigned
        assert!(matches!(
            service.complete(&vet, &appt.id, input(), Utc::now()),
            Err(ScheduleError::Transition(TransitionError::NotAssignedVet { .. }))
        ));
    }

    #[test]
    fn test_complete_and_read_back() {
        let (db, appt) = setup();
        let service = MedicalRecordService::new(&db);
        let vet = Actor::new("vet-1", Role::Vet);
        db.claim_appointment(&appt.id, "vet-1", Utc::now()).unwrap();

        let record = service.complete(&vet, &appt.id, input(), Utc::now()).unwrap();
        assert_eq!(record.vet_id, "vet-1");

        let stored = db.get_appointment(&appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);

        let owner = Actor::new("owner-1", Role::PetOwner);
        assert_eq!(service.get(&owner, &appt.id).unwrap(), Some(record));
        assert!(matches!(
            service.get(&Actor::new("vet-2", Role::Vet), &appt.id),
            Err(ScheduleError::Forbidden(_))
        ));

        // Completed is terminal
        assert!(service.complete(&vet, &appt.id, input(), Utc::now()).is_err());
    }

    #[test]
    fn test_other_vet_cannot_complete() {
        let (db, appt) = setup();
        let service = MedicalRecordService::new(&db);
        db.claim_appointment(&appt.id, "vet-1", Utc::now()).unwrap();

        let other = Actor::new("vet-2", Role::Vet);
        assert!(matches!(
            service.complete(&other, &appt.id, input(), Utc::now()),
            Err(ScheduleError::Transition(TransitionError::NotAssignedVet { .. }))
        ));
        assert!(db.get_medical_record(&appt.id).unwrap().is_none());
    }
}
