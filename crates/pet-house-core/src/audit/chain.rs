//! Hash chain over status events.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::db::Database;
use crate::models::{EntityKind, StatusChange, StatusEvent};

/// Audit trail errors.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Audit chain broken at event {seq}")]
    ChainBroken { seq: i64 },
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Audit trail manager.
pub struct AuditTrail<'a> {
    db: &'a Database,
}

impl<'a> AuditTrail<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a change to the chain.
    pub fn record(&self, change: StatusChange) -> AuditResult<StatusEvent> {
        let payload = change.to_canonical_json()?;
        let (seq, prev_hash, hash) = self
            .db
            .append_status_event(&change, &payload, |prev| chain_hash(prev, &payload))?;
        tracing::debug!(
            seq,
            entity = change.entity_kind.as_str(),
            entity_id = %change.entity_id,
            to = %change.to_status,
            "status event recorded"
        );

        Ok(StatusEvent {
            seq,
            change,
            prev_hash,
            hash,
        })
    }

    /// Every recorded change for one entity, oldest first.
    pub fn history(&self, kind: EntityKind, entity_id: &str) -> AuditResult<Vec<StatusEvent>> {
        Ok(self.db.list_status_events(kind, entity_id)?)
    }

    /// Most recent rejection reason for a booking or appointment.
    pub fn latest_reason(&self, kind: EntityKind, entity_id: &str) -> AuditResult<Option<String>> {
        Ok(self
            .history(kind, entity_id)?
            .into_iter()
            .rev()
            .find_map(|event| event.change.reason))
    }

    /// Walk the whole chain. Returns the number of events checked.
    pub fn verify(&self) -> AuditResult<usize> {
        let events = self.db.list_all_status_events()?;
        let mut prev_hash = String::new();

        for event in &events {
            let payload = event.change.to_canonical_json()?;
            if event.prev_hash != prev_hash || event.hash != chain_hash(&prev_hash, &payload) {
                return Err(AuditError::ChainBroken { seq: event.seq });
            }
            prev_hash = event.hash.clone();
        }

        Ok(events.len())
    }
}

/// Hash data with SHA-256, hex encoded.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Link hash for an event following `prev_hash`.
pub fn chain_hash(prev_hash: &str, payload: &str) -> String {
    let mut combined = String::with_capacity(prev_hash.len() + payload.len());
    combined.push_str(prev_hash);
    combined.push_str(payload);
    hash_data(combined.as_bytes())
}
