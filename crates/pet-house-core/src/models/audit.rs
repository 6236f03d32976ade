//! Status transition audit events.

use serde::{Deserialize, Serialize};

/// Which table a status event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Appointment,
    BoardingBooking,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Appointment => "appointment",
            EntityKind::BoardingBooking => "boarding_booking",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "appointment" => Some(EntityKind::Appointment),
            "boarding_booking" => Some(EntityKind::BoardingBooking),
            _ => None,
        }
    }
}

/// Payload hashed into the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    /// `None` for creation events
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor_id: String,
    /// Free-text justification (mandatory for boarding rejections)
    pub reason: Option<String>,
    pub created_at: String,
}

impl StatusChange {
    pub fn new(
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        from_status: Option<&str>,
        to_status: &str,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            entity_kind,
            entity_id: entity_id.into(),
            from_status: from_status.map(str::to_string),
            to_status: to_status.to_string(),
            actor_id: actor_id.into(),
            reason: None,
            created_at: super::now_timestamp(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Serialize to canonical JSON for hashing.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A persisted, chained status event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEvent {
    /// Position in the chain, starting at 1
    pub seq: i64,
    pub change: StatusChange,
    /// Hash of the previous event, empty for the first
    pub prev_hash: String,
    pub hash: String,
}
