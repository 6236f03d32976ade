//! Appointment actions.

use chrono::{DateTime, TimeZone, Utc};

use super::{name_or, notify, ScheduleError, ScheduleResult};
use crate::audit::AuditTrail;
use crate::config::Config;
use crate::db::{AppointmentPatch, Database};
use crate::lifecycle::{check_appointment_transition, Actor, AppointmentAction, TransitionError};
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentTab, AppointmentView, EntityKind,
    Role, StatusChange,
};
use crate::validation::AppointmentRequest;

/// Result of a vet's claim attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The appointment is now confirmed with the caller as its vet
    Claimed(AppointmentView),
    /// Another vet got there first. Informational; do not retry.
    AlreadyClaimed,
}

/// Appointment service.
pub struct AppointmentService<'a> {
    db: &'a Database,
    config: &'a Config,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database, config: &'a Config) -> Self {
        Self { db, config }
    }

    /// Book a pending appointment for one of the owner's pets.
    ///
    /// Local datetimes in the request are read in `tz`.
    pub fn create<Tz: TimeZone>(
        &self,
        actor: &Actor,
        request: &AppointmentRequest,
        tz: &Tz,
    ) -> ScheduleResult<AppointmentView> {
        let valid = request.validate(actor.role, tz, self.config)?;

        let pet = self
            .db
            .get_pet(&request.pet_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Pet {}", request.pet_id)))?;
        if pet.owner_id != actor.id {
            return Err(ScheduleError::Forbidden("pet belongs to another owner".into()));
        }

        let vet_id = match request.vet_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let vet = self.db.get_profile(id)?.filter(|p| p.role == Role::Vet);
                Some(vet.ok_or_else(|| ScheduleError::NotFound(format!("Vet {id}")))?.id)
            }
            _ => None,
        };

        let mut appointment = Appointment::new(
            pet.id,
            actor.id.clone(),
            valid.start_time,
            valid.duration,
            request.service_type,
        );
        appointment.vet_id = vet_id;
        appointment.owner_note = request
            .owner_note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string);

        self.db.atomically(|| -> ScheduleResult<_> {
            self.db.insert_appointment(&appointment)?;
            AuditTrail::new(self.db).record(StatusChange::new(
                EntityKind::Appointment,
                &appointment.id,
                None,
                appointment.status.as_str(),
                &actor.id,
            ))?;
            Ok(())
        })?;
        tracing::info!(
            appointment_id = %appointment.id,
            owner_id = %actor.id,
            start = %appointment.start_time,
            "appointment requested"
        );

        let view = self.load(&appointment.id)?;
        if let Some(vet_id) = &view.appointment.vet_id {
            notify(
                self.db,
                vet_id,
                "New appointment request",
                format!(
                    "{} requested a {} for {} on {}.",
                    name_or(&view.owner_name, "An owner"),
                    view.appointment.service_type.as_str(),
                    name_or(&view.pet_name, "their pet"),
                    format_start(&view.appointment.start_time),
                ),
            );
        }
        Ok(view)
    }

    /// Take an unassigned pending appointment.
    ///
    /// Losing the race is reported as [`ClaimOutcome::AlreadyClaimed`].
    pub fn claim(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<ClaimOutcome> {
        match self.transition(actor, id, AppointmentAction::Claim, now) {
            Ok(view) => Ok(ClaimOutcome::Claimed(view)),
            Err(ScheduleError::StaleState(_))
            | Err(ScheduleError::Transition(TransitionError::AlreadyAssigned)) => {
                tracing::warn!(appointment_id = id, vet_id = %actor.id, "claim lost, already assigned");
                Ok(ClaimOutcome::AlreadyClaimed)
            }
            Err(e) => Err(e),
        }
    }

    /// Confirm a pending appointment the owner addressed to this vet.
    pub fn accept_assigned(
        &self,
        actor: &Actor,
        id: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AppointmentView> {
        self.transition(actor, id, AppointmentAction::AcceptAssigned, now)
    }

    /// Cancel as the owner (before start) or as staff/admin (any time).
    pub fn cancel(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<AppointmentView> {
        let action = if actor.role == Role::PetOwner {
            AppointmentAction::OwnerCancel
        } else {
            AppointmentAction::StaffCancel
        };
        self.transition(actor, id, action, now)
    }

    /// Turn an appointment down (staff/admin).
    pub fn reject(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<AppointmentView> {
        self.transition(actor, id, AppointmentAction::Reject, now)
    }

    /// Owner edits to a pending appointment.
    pub fn update_pending(
        &self,
        actor: &Actor,
        id: &str,
        patch: &AppointmentPatch,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AppointmentView> {
        let current = self.load(id)?.appointment;
        if actor.role != Role::PetOwner || current.owner_id != actor.id {
            return Err(TransitionError::NotOwner {
                action: "edit an appointment",
            }
            .into());
        }
        if current.status != AppointmentStatus::Pending {
            return Err(TransitionError::IllegalFromStatus {
                from: current.status.to_string(),
                action: "edit an appointment",
            }
            .into());
        }
        let pet = self
            .db
            .get_pet(&patch.pet_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Pet {}", patch.pet_id)))?;
        if pet.owner_id != actor.id {
            return Err(ScheduleError::Forbidden("pet belongs to another owner".into()));
        }

        if !self.db.update_pending_appointment(id, &actor.id, patch, now)? {
            return Err(ScheduleError::StaleState(format!("Appointment {id}")));
        }
        tracing::info!(appointment_id = id, owner_id = %actor.id, "pending appointment edited");
        self.load(id)
    }

    /// The caller's appointment list.
    ///
    /// Vets and owners get their dashboard tab; staff and admins get every
    /// appointment matching `filter`, with `tab` ignored.
    pub fn list(
        &self,
        actor: &Actor,
        tab: AppointmentTab,
        filter: &AppointmentFilter,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Vec<AppointmentView>> {
        let views = match actor.role {
            Role::Vet => self.db.list_vet_appointments(&actor.id, tab, now)?,
            Role::PetOwner => self.db.list_owner_appointments(&actor.id, tab, filter, now)?,
            Role::Staff | Role::Admin => self.db.list_all_appointments(filter)?,
        };
        Ok(views)
    }

    /// Load one appointment with its display names.
    pub fn get(&self, id: &str) -> ScheduleResult<AppointmentView> {
        self.load(id)
    }

    fn load(&self, id: &str) -> ScheduleResult<AppointmentView> {
        self.db
            .get_appointment_view(id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Appointment {id}")))
    }

    fn transition(
        &self,
        actor: &Actor,
        id: &str,
        action: AppointmentAction,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AppointmentView> {
        let current = self.load(id)?.appointment;
        let to = check_appointment_transition(&current, actor, action, now).map_err(|e| {
            tracing::warn!(
                appointment_id = id,
                actor_id = %actor.id,
                role = %actor.role,
                error = %e,
                "appointment transition denied"
            );
            e
        })?;

        // The guarded update and its audit event commit or roll back together.
        self.db.atomically(|| -> ScheduleResult<_> {
            let updated = match action {
                AppointmentAction::Claim => self.db.claim_appointment(id, &actor.id, now)?,
                AppointmentAction::AcceptAssigned => {
                    self.db.accept_assigned_appointment(id, &actor.id, now)?
                }
                AppointmentAction::OwnerCancel => {
                    self.db
                        .cancel_owned_appointment(id, &actor.id, current.status, now)?
                }
                AppointmentAction::StaffCancel | AppointmentAction::Reject => {
                    self.db.set_appointment_status(id, current.status, to, now)?
                }
                AppointmentAction::Complete => return Err(ScheduleError::MedicalRecordRequired),
            };
            if !updated {
                return Err(ScheduleError::StaleState(format!("Appointment {id}")));
            }

            AuditTrail::new(self.db).record(StatusChange::new(
                EntityKind::Appointment,
                id,
                Some(current.status.as_str()),
                to.as_str(),
                &actor.id,
            ))?;
            Ok(())
        })?;
        tracing::info!(
            appointment_id = id,
            actor_id = %actor.id,
            from = %current.status,
            to = %to,
            "appointment transition"
        );

        let view = self.load(id)?;
        self.notify_transition(&view, action);
        Ok(view)
    }

    fn notify_transition(&self, view: &AppointmentView, action: AppointmentAction) {
        let appt = &view.appointment;
        let what = format!(
            "{} for {} on {}",
            appt.service_type.as_str(),
            name_or(&view.pet_name, "your pet"),
            format_start(&appt.start_time),
        );
        match action {
            AppointmentAction::Claim | AppointmentAction::AcceptAssigned => notify(
                self.db,
                &appt.owner_id,
                "Appointment confirmed",
                format!("Your {what} was confirmed by {}.", name_or(&view.vet_name, "a vet")),
            ),
            AppointmentAction::Reject => notify(
                self.db,
                &appt.owner_id,
                "Appointment rejected",
                format!("Your {what} was rejected."),
            ),
            AppointmentAction::StaffCancel => notify(
                self.db,
                &appt.owner_id,
                "Appointment cancelled",
                format!("Your {what} was cancelled by the clinic."),
            ),
            AppointmentAction::OwnerCancel => {
                if let Some(vet_id) = &appt.vet_id {
                    notify(
                        self.db,
                        vet_id,
                        "Appointment cancelled",
                        format!("The owner cancelled the {what}."),
                    );
                }
            }
            AppointmentAction::Complete => {}
        }
    }
}

fn format_start(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
