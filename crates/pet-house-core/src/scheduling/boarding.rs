//! Boarding actions.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::{name_or, notify, require_admin, require_staff, ScheduleError, ScheduleResult};
use crate::audit::AuditTrail;
use crate::calendar::RoomOccupancy;
use crate::db::Database;
use crate::lifecycle::{check_boarding_transition, Actor, BoardingAction, TransitionError};
use crate::models::{
    BoardingBooking, BoardingHealthLog, BoardingRoom, BoardingStatus, BookingView, EntityKind,
    Role, StatusChange,
};
use crate::validation::{validate_rejection_reason, BookingRequest};

/// Boarding service.
pub struct BoardingService<'a> {
    db: &'a Database,
}

impl<'a> BoardingService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------------

    /// Submit the registration wizard. The room price is snapshotted.
    pub fn create_booking(&self, actor: &Actor, request: &BookingRequest) -> ScheduleResult<BookingView> {
        if actor.role != Role::PetOwner {
            return Err(ScheduleError::Forbidden("only pet owners can book boarding".into()));
        }
        let valid = request.validate()?;

        let pet = self
            .db
            .get_pet(&request.pet_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Pet {}", request.pet_id)))?;
        if pet.owner_id != actor.id {
            return Err(ScheduleError::Forbidden("pet belongs to another owner".into()));
        }
        let room = self
            .db
            .get_room(&request.room_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Room {}", request.room_id)))?;
        if !room.is_available {
            return Err(ScheduleError::Forbidden(format!("room {} is not available", room.name)));
        }

        let mut booking =
            BoardingBooking::new(pet.id, actor.id.clone(), &room, valid.check_in, valid.check_out);
        booking.special_notes = non_blank(&request.special_notes);
        booking.dietary_requirements = non_blank(&request.dietary_requirements);
        booking.medical_requirements = non_blank(&request.medical_requirements);

        self.db.atomically(|| -> ScheduleResult<_> {
            self.db.insert_booking(&booking)?;
            AuditTrail::new(self.db).record(StatusChange::new(
                EntityKind::BoardingBooking,
                &booking.id,
                None,
                booking.status.as_str(),
                &actor.id,
            ))?;
            Ok(())
        })?;
        tracing::info!(
            booking_id = %booking.id,
            owner_id = %actor.id,
            days = booking.days(),
            total = booking.total_price,
            "boarding requested"
        );

        self.load(&booking.id)
    }

    pub fn approve(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<BookingView> {
        self.transition(actor, id, BoardingAction::Approve, now)
    }

    /// Decline a pending request. The reason is kept in the audit trail and
    /// sent to the owner.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<BookingView> {
        let reason = validate_rejection_reason(reason)?;
        self.transition(
            actor,
            id,
            BoardingAction::Reject {
                reason: reason.to_string(),
            },
            now,
        )
    }

    pub fn check_in(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<BookingView> {
        self.transition(actor, id, BoardingAction::CheckIn, now)
    }

    pub fn check_out(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<BookingView> {
        self.transition(actor, id, BoardingAction::CheckOut, now)
    }

    /// Why a booking was declined, if it was.
    pub fn rejection_reason(&self, id: &str) -> ScheduleResult<Option<String>> {
        Ok(AuditTrail::new(self.db).latest_reason(EntityKind::BoardingBooking, id)?)
    }

    /// Record payment for a stay that has started (admin).
    pub fn mark_paid(&self, actor: &Actor, id: &str, now: DateTime<Utc>) -> ScheduleResult<BookingView> {
        require_admin(actor, "record payments")?;
        let current = self.load(id)?.booking;
        if !self.db.mark_booking_paid(id, now)? {
            return Err(ScheduleError::Forbidden(format!(
                "booking in status {} with payment {} cannot be marked paid",
                current.status,
                current.payment_status.as_str()
            )));
        }
        tracing::info!(booking_id = id, admin_id = %actor.id, amount = current.total_price, "payment recorded");
        self.load(id)
    }

    pub fn get(&self, id: &str) -> ScheduleResult<BookingView> {
        self.load(id)
    }

    /// The owner's own bookings, newest first.
    pub fn list_for_owner(&self, actor: &Actor) -> ScheduleResult<Vec<BookingView>> {
        Ok(self.db.list_owner_bookings(&actor.id)?)
    }

    /// Staff dashboard tab.
    pub fn list_by_status(
        &self,
        actor: &Actor,
        statuses: &[BoardingStatus],
    ) -> ScheduleResult<Vec<BookingView>> {
        require_staff(actor, "view the boarding dashboard")?;
        Ok(self.db.list_bookings_by_status(statuses)?)
    }

    /// Pending requests awaiting approval.
    pub fn approval_queue(&self, actor: &Actor) -> ScheduleResult<Vec<BookingView>> {
        self.list_by_status(actor, &[BoardingStatus::Pending])
    }

    // ------------------------------------------------------------------------
    // Health logs
    // ------------------------------------------------------------------------

    /// Append a health entry for a pet currently in residence.
    pub fn add_health_log(&self, actor: &Actor, mut log: BoardingHealthLog) -> ScheduleResult<BoardingHealthLog> {
        require_staff(actor, "write health logs")?;
        let booking = self.load(&log.booking_id)?.booking;
        if booking.status != BoardingStatus::CheckedIn {
            return Err(TransitionError::IllegalFromStatus {
                from: booking.status.to_string(),
                action: "write health logs",
            }
            .into());
        }

        log.logged_by_staff_id = actor.id.clone();
        self.db.insert_health_log(&log)?;
        tracing::info!(
            booking_id = %log.booking_id,
            staff_id = %actor.id,
            health = log.health_status.as_str(),
            "health log added"
        );
        Ok(log)
    }

    /// Health entries, newest first. Owners see only their own pets.
    pub fn health_logs(&self, actor: &Actor, booking_id: &str) -> ScheduleResult<Vec<BoardingHealthLog>> {
        let booking = self.load(booking_id)?.booking;
        if !actor.role.is_staff_or_admin() && booking.owner_id != actor.id {
            return Err(ScheduleError::Forbidden("not your booking".into()));
        }
        Ok(self.db.list_health_logs(booking_id)?)
    }

    // ------------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------------

    /// Rooms an owner can pick from.
    pub fn available_rooms(&self) -> ScheduleResult<Vec<BoardingRoom>> {
        Ok(self.db.list_rooms(true)?)
    }

    /// Every room, including unavailable ones (admin).
    pub fn all_rooms(&self, actor: &Actor) -> ScheduleResult<Vec<BoardingRoom>> {
        require_admin(actor, "manage rooms")?;
        Ok(self.db.list_rooms(false)?)
    }

    pub fn create_room(&self, actor: &Actor, room: BoardingRoom) -> ScheduleResult<BoardingRoom> {
        require_admin(actor, "manage rooms")?;
        self.db.insert_room(&room)?;
        tracing::info!(room_id = %room.id, name = %room.name, "room created");
        Ok(room)
    }

    pub fn set_room_availability(
        &self,
        actor: &Actor,
        room_id: &str,
        is_available: bool,
    ) -> ScheduleResult<()> {
        require_admin(actor, "manage rooms")?;
        if !self.db.set_room_availability(room_id, is_available)? {
            return Err(ScheduleError::NotFound(format!("Room {room_id}")));
        }
        tracing::info!(room_id, is_available, "room availability changed");
        Ok(())
    }

    /// Nightly occupancy for a room over `[from, to)`. Informational only.
    pub fn room_occupancy(&self, room_id: &str, from: NaiveDate, to: NaiveDate) -> ScheduleResult<RoomOccupancy> {
        let room = self
            .db
            .get_room(room_id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Room {room_id}")))?;
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to.and_time(NaiveTime::MIN).and_utc();
        let views = self.db.list_room_bookings(room_id, start, end)?;

        Ok(RoomOccupancy::build(
            &room.id,
            room.capacity,
            views.iter().map(|v| &v.booking),
            from,
            to,
        ))
    }

    fn load(&self, id: &str) -> ScheduleResult<BookingView> {
        self.db
            .get_booking_view(id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("Booking {id}")))
    }

    fn transition(
        &self,
        actor: &Actor,
        id: &str,
        action: BoardingAction,
        now: DateTime<Utc>,
    ) -> ScheduleResult<BookingView> {
        let current = self.load(id)?.booking;
        let to = check_boarding_transition(&current, actor, &action).map_err(|e| {
            tracing::warn!(
                booking_id = id,
                actor_id = %actor.id,
                role = %actor.role,
                error = %e,
                "boarding transition denied"
            );
            e
        })?;

        let mut change = StatusChange::new(
            EntityKind::BoardingBooking,
            id,
            Some(current.status.as_str()),
            to.as_str(),
            &actor.id,
        );
        if let Some(reason) = action.reason() {
            change = change.with_reason(reason);
        }

        // A rejection without its stored reason never commits.
        self.db.atomically(|| -> ScheduleResult<_> {
            let updated = match &action {
                BoardingAction::Approve | BoardingAction::Reject { .. } => {
                    self.db.set_booking_status(id, current.status, to, now)?
                }
                BoardingAction::CheckIn => self.db.check_in_booking(id, &actor.id, now)?,
                BoardingAction::CheckOut => self.db.check_out_booking(id, &actor.id, now)?,
            };
            if !updated {
                return Err(ScheduleError::StaleState(format!("Booking {id}")));
            }
            AuditTrail::new(self.db).record(change)?;
            Ok(())
        })?;
        tracing::info!(
            booking_id = id,
            actor_id = %actor.id,
            from = %current.status,
            to = %to,
            "boarding transition"
        );

        let view = self.load(id)?;
        self.notify_transition(&view, &action);
        Ok(view)
    }

    fn notify_transition(&self, view: &BookingView, action: &BoardingAction) {
        let booking = &view.booking;
        let pet = name_or(&view.pet_name, "your pet");
        let stay = format!(
            "{} to {}",
            booking.check_in_date.format("%Y-%m-%d"),
            booking.check_out_date.format("%Y-%m-%d")
        );
        let (title, message) = match action {
            BoardingAction::Approve => (
                "Boarding confirmed",
                format!("{pet}'s stay ({stay}) in {} is confirmed.", name_or(&view.room_name, "our boarding house")),
            ),
            BoardingAction::Reject { reason } => (
                "Boarding request declined",
                format!("{pet}'s stay ({stay}) was declined: {}", reason.trim()),
            ),
            BoardingAction::CheckIn => ("Checked in", format!("{pet} has been checked in.")),
            BoardingAction::CheckOut => (
                "Checked out",
                format!("{pet} has been checked out and is ready to go home."),
            ),
        };
        notify(self.db, &booking.owner_id, title, message);
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
