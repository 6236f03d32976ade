//! Status lifecycle rules for appointments and boarding stays.
//!
//! Every transition is checked here before any update is issued. A request
//! outside the table is refused with a [`TransitionError`]; it is never
//! rewritten into a neighbouring legal transition.
//!
//! ```text
//! Appointment:  pending ──claim/accept──▶ confirmed ──record written──▶ completed
//!                  │                          │
//!                  └──── cancel / reject ─────┴──▶ cancelled | rejected
//!
//! Boarding:     pending ──approve──▶ confirmed ──check in──▶ checked_in ──check out──▶ completed
//!                  │
//!                  └──reject (reason)──▶ cancelled
//! ```

mod appointment;
mod boarding;

pub use appointment::*;
pub use boarding::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Role, UserProfile};

/// Who is asking for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl From<&UserProfile> for Actor {
    fn from(profile: &UserProfile) -> Self {
        Self::new(profile.id.clone(), profile.role)
    }
}

/// Why a transition was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Role {role} may not {action}")]
    RoleNotPermitted { role: Role, action: &'static str },

    #[error("Cannot {action} from status {from}")]
    IllegalFromStatus { from: String, action: &'static str },

    #[error("Appointment has already started and can no longer be cancelled")]
    StartTimePassed,

    #[error("Only the owner may {action}")]
    NotOwner { action: &'static str },

    #[error("Only the assigned vet may {action}")]
    NotAssignedVet { action: &'static str },

    #[error("Appointment already has a vet assigned")]
    AlreadyAssigned,

    #[error("A reason is required to {action}")]
    ReasonRequired { action: &'static str },
}

pub type TransitionResult<T> = Result<T, TransitionError>;
