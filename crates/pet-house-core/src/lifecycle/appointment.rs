//! Appointment transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Actor, TransitionError, TransitionResult};
use crate::models::{Appointment, AppointmentStatus, Role};

/// A requested appointment transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentAction {
    /// Vet takes an unassigned pending appointment
    Claim,
    /// Vet confirms a pending appointment the owner addressed to them
    AcceptAssigned,
    /// Owner calls off their own appointment before it starts
    OwnerCancel,
    /// Front desk calls off an appointment
    StaffCancel,
    /// Front desk turns an appointment down
    Reject,
    /// Assigned vet closes the visit by writing the medical record
    Complete,
}

impl AppointmentAction {
    pub const ALL: [AppointmentAction; 6] = [
        AppointmentAction::Claim,
        AppointmentAction::AcceptAssigned,
        AppointmentAction::OwnerCancel,
        AppointmentAction::StaffCancel,
        AppointmentAction::Reject,
        AppointmentAction::Complete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AppointmentAction::Claim => "claim an appointment",
            AppointmentAction::AcceptAssigned => "accept an appointment",
            AppointmentAction::OwnerCancel => "cancel an appointment",
            AppointmentAction::StaffCancel => "cancel an appointment",
            AppointmentAction::Reject => "reject an appointment",
            AppointmentAction::Complete => "complete an appointment",
        }
    }

    /// Status the appointment moves to when the action succeeds.
    pub fn target(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Claim | AppointmentAction::AcceptAssigned => {
                AppointmentStatus::Confirmed
            }
            AppointmentAction::OwnerCancel | AppointmentAction::StaffCancel => {
                AppointmentStatus::Cancelled
            }
            AppointmentAction::Reject => AppointmentStatus::Rejected,
            AppointmentAction::Complete => AppointmentStatus::Completed,
        }
    }

    fn allowed_from(self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            AppointmentAction::Claim | AppointmentAction::AcceptAssigned => &[Pending],
            AppointmentAction::OwnerCancel
            | AppointmentAction::StaffCancel
            | AppointmentAction::Reject => &[Pending, Confirmed],
            AppointmentAction::Complete => &[Confirmed],
        }
    }

    fn permits_role(self, role: Role) -> bool {
        match self {
            AppointmentAction::Claim
            | AppointmentAction::AcceptAssigned
            | AppointmentAction::Complete => role == Role::Vet,
            AppointmentAction::OwnerCancel => role == Role::PetOwner,
            AppointmentAction::StaffCancel | AppointmentAction::Reject => role.is_staff_or_admin(),
        }
    }
}

/// Decide whether `actor` may apply `action` to `appointment` at `now`.
///
/// Returns the status the appointment would move to.
pub fn check_appointment_transition(
    appointment: &Appointment,
    actor: &Actor,
    action: AppointmentAction,
    now: DateTime<Utc>,
) -> TransitionResult<AppointmentStatus> {
    if !action.permits_role(actor.role) {
        return Err(TransitionError::RoleNotPermitted {
            role: actor.role,
            action: action.name(),
        });
    }

    match action {
        AppointmentAction::OwnerCancel => {
            if appointment.owner_id != actor.id {
                return Err(TransitionError::NotOwner {
                    action: action.name(),
                });
            }
            // Refused once started, whatever the status.
            if !appointment.starts_after(now) {
                return Err(TransitionError::StartTimePassed);
            }
        }
        AppointmentAction::Claim => {
            if appointment.vet_id.is_some() {
                return Err(TransitionError::AlreadyAssigned);
            }
        }
        AppointmentAction::AcceptAssigned | AppointmentAction::Complete => {
            if appointment.vet_id.as_deref() != Some(actor.id.as_str()) {
                return Err(TransitionError::NotAssignedVet {
                    action: action.name(),
                });
            }
        }
        AppointmentAction::StaffCancel | AppointmentAction::Reject => {}
    }

    if !action.allowed_from().contains(&appointment.status) {
        return Err(TransitionError::IllegalFromStatus {
            from: appointment.status.to_string(),
            action: action.name(),
        });
    }

    Ok(action.target())
}

/// Actions `actor` could take on `appointment` right now, for rendering controls.
pub fn available_appointment_actions(
    appointment: &Appointment,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Vec<AppointmentAction> {
    AppointmentAction::ALL
        .into_iter()
        .filter(|action| check_appointment_transition(appointment, actor, *action, now).is_ok())
        .collect()
}
