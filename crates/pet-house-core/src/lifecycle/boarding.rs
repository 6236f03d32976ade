//! Boarding stay transitions.

use serde::{Deserialize, Serialize};

use super::{Actor, TransitionError, TransitionResult};
use crate::models::{BoardingBooking, BoardingStatus};

/// A requested boarding transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardingAction {
    Approve,
    /// Turn the request down; the reason goes to the audit trail and the owner
    Reject { reason: String },
    CheckIn,
    CheckOut,
}

impl BoardingAction {
    pub fn name(&self) -> &'static str {
        match self {
            BoardingAction::Approve => "approve a booking",
            BoardingAction::Reject { .. } => "reject a booking",
            BoardingAction::CheckIn => "check in a pet",
            BoardingAction::CheckOut => "check out a pet",
        }
    }

    /// Required current status and resulting status.
    pub fn edge(&self) -> (BoardingStatus, BoardingStatus) {
        match self {
            BoardingAction::Approve => (BoardingStatus::Pending, BoardingStatus::Confirmed),
            BoardingAction::Reject { .. } => (BoardingStatus::Pending, BoardingStatus::Cancelled),
            BoardingAction::CheckIn => (BoardingStatus::Confirmed, BoardingStatus::CheckedIn),
            BoardingAction::CheckOut => (BoardingStatus::CheckedIn, BoardingStatus::Completed),
        }
    }

    /// Reason text, trimmed, for rejections.
    pub fn reason(&self) -> Option<&str> {
        match self {
            BoardingAction::Reject { reason } => Some(reason.trim()),
            _ => None,
        }
    }
}

/// Decide whether `actor` may apply `action` to `booking`.
///
/// Every boarding transition belongs to staff or admins. Returns the status the
/// booking would move to.
pub fn check_boarding_transition(
    booking: &BoardingBooking,
    actor: &Actor,
    action: &BoardingAction,
) -> TransitionResult<BoardingStatus> {
    if !actor.role.is_staff_or_admin() {
        return Err(TransitionError::RoleNotPermitted {
            role: actor.role,
            action: action.name(),
        });
    }

    if let Some(reason) = action.reason() {
        if reason.is_empty() {
            return Err(TransitionError::ReasonRequired {
                action: action.name(),
            });
        }
    }

    let (from, to) = action.edge();
    if booking.status != from {
        return Err(TransitionError::IllegalFromStatus {
            from: booking.status.to_string(),
            action: action.name(),
        });
    }

    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoardingRoom, Role};
    use chrono::{TimeZone, Utc};

    fn booking(status: BoardingStatus) -> BoardingBooking {
        let room = BoardingRoom::new("Suite".into(), 1, 50.0);
        let mut booking = BoardingBooking::new(
            "pet".into(),
            "owner".into(),
            &room,
            Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        );
        booking.status = status;
        booking
    }

    #[test]
    fn test_full_happy_path() {
        let staff = Actor::new("staff-1", Role::Staff);
        let steps = [
            (BoardingStatus::Pending, BoardingAction::Approve, BoardingStatus::Confirmed),
            (BoardingStatus::Confirmed, BoardingAction::CheckIn, BoardingStatus::CheckedIn),
            (BoardingStatus::CheckedIn, BoardingAction::CheckOut, BoardingStatus::Completed),
        ];
        for (from, action, to) in steps {
            assert_eq!(check_boarding_transition(&booking(from), &staff, &action), Ok(to));
        }
    }

    #[test]
    fn test_reject_requires_reason() {
        let admin = Actor::new("admin-1", Role::Admin);
        let pending = booking(BoardingStatus::Pending);

        let blank = BoardingAction::Reject { reason: "   ".into() };
        assert!(matches!(
            check_boarding_transition(&pending, &admin, &blank),
            Err(TransitionError::ReasonRequired { .. })
        ));

        let with_reason = BoardingAction::Reject {
            reason: "Vaccination records missing".into(),
        };
        assert_eq!(
            check_boarding_transition(&pending, &admin, &with_reason),
            Ok(BoardingStatus::Cancelled)
        );
    }

    #[test]
    fn test_owner_and_vet_cannot_move_bookings() {
        let pending = booking(BoardingStatus::Pending);
        for role in [Role::PetOwner, Role::Vet] {
            let actor = Actor::new("someone", role);
            assert!(matches!(
                check_boarding_transition(&pending, &actor, &BoardingAction::Approve),
                Err(TransitionError::RoleNotPermitted { .. })
            ));
        }
    }

    #[test]
    fn test_out_of_order_transitions_rejected() {
        let staff = Actor::new("staff-1", Role::Staff);
        // Check-in straight from pending skips approval.
        assert!(matches!(
            check_boarding_transition(&booking(BoardingStatus::Pending), &staff, &BoardingAction::CheckIn),
            Err(TransitionError::IllegalFromStatus { .. })
        ));
        // Check-out of a stay that never started.
        assert!(check_boarding_transition(&booking(BoardingStatus::Confirmed), &staff, &BoardingAction::CheckOut).is_err());
        // Nothing leaves a terminal status.
        for status in [BoardingStatus::Completed, BoardingStatus::Cancelled] {
            for action in [BoardingAction::Approve, BoardingAction::CheckIn, BoardingAction::CheckOut] {
                assert!(check_boarding_transition(&booking(status), &staff, &action).is_err());
            }
        }
    }
}
