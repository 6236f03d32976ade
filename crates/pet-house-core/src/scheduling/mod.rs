//! Service objects that carry out user actions.
//!
//! Each action runs the same pipeline: validate the form, check the
//! transition against the caller's role, issue one guarded update, append the
//! change to the audit trail and notify whoever needs to know.

mod admin;
mod appointments;
mod boarding;
mod medical;

pub use admin::*;
pub use appointments::*;
pub use boarding::*;
pub use medical::*;

use thiserror::Error;

use crate::audit::AuditError;
use crate::db::{Database, DbError};
use crate::lifecycle::{Actor, TransitionError};
use crate::models::{Notification, Role};
use crate::validation::ValidationError;

/// Errors from service actions.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// The guarded update matched no row; the record changed underneath us
    #[error("{0} was modified by someone else, refresh and try again")]
    StaleState(String),

    #[error("Appointments are completed by writing a medical record")]
    MedicalRecordRequired,
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Insert a notification. Failures are logged, never returned: the action it
/// reports on has already been committed.
fn notify(db: &Database, user_id: &str, title: &str, message: String) {
    let notification = Notification::new(user_id.to_string(), title, message);
    if let Err(e) = db.insert_notification(&notification) {
        tracing::warn!(user_id, title, error = %e, "failed to store notification");
    }
}

/// Display name with a fallback for missing joins.
fn name_or<'a>(name: &'a Option<String>, fallback: &'a str) -> &'a str {
    name.as_deref().unwrap_or(fallback)
}

fn require_staff(actor: &Actor, action: &'static str) -> ScheduleResult<()> {
    if actor.role.is_staff_or_admin() {
        Ok(())
    } else {
        Err(TransitionError::RoleNotPermitted {
            role: actor.role,
            action,
        }
        .into())
    }
}

fn require_admin(actor: &Actor, action: &'static str) -> ScheduleResult<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(TransitionError::RoleNotPermitted {
            role: actor.role,
            action,
        }
        .into())
    }
}
