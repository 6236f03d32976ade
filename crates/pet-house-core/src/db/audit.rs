//! Status event database operations.
//!
//! Hashing lives in `crate::audit`; this file only stores and loads the chain.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{EntityKind, StatusChange, StatusEvent};

impl Database {
    /// Append an event to the chain. Returns its sequence number.
    pub fn insert_status_event(
        &self,
        change: &StatusChange,
        payload: &str,
        prev_hash: &str,
        hash: &str,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO status_events (entity_kind, entity_id, payload, prev_hash, hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                change.entity_kind.as_str(),
                change.entity_id,
                payload,
                prev_hash,
                hash,
                change.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append after the current chain head, holding the write lock from the
    /// head read to the insert. Joins the caller's transaction when one is open. `link` derives the new hash from the previous one.
    ///
    /// Returns `(seq, prev_hash, hash)`.
    pub fn append_status_event<F>(
        &self,
        change: &StatusChange,
        payload: &str,
        link: F,
    ) -> DbResult<(i64, String, String)>
    where
        F: FnOnce(&str) -> String,
    {
        self.atomically(|| -> DbResult<_> {
            let prev_hash = self.last_status_event_hash()?.unwrap_or_default();
            let hash = link(&prev_hash);
            let seq = self.insert_status_event(change, payload, &prev_hash, &hash)?;
            Ok((seq, prev_hash, hash))
        })
    }

    /// Hash of the newest event, if any.
    pub fn last_status_event_hash(&self) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT hash FROM status_events ORDER BY seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Events for one entity, oldest first.
    pub fn list_status_events(&self, kind: EntityKind, entity_id: &str) -> DbResult<Vec<StatusEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT seq, payload, prev_hash, hash FROM status_events
            WHERE entity_kind = ? AND entity_id = ?
            ORDER BY seq
            "#,
        )?;
        let rows = stmt.query_map(params![kind.as_str(), entity_id], read_event)?;
        collect_events(rows)
    }

    /// The whole chain, oldest first.
    pub fn list_all_status_events(&self) -> DbResult<Vec<StatusEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT seq, payload, prev_hash, hash FROM status_events ORDER BY seq")?;
        let rows = stmt.query_map([], read_event)?;
        collect_events(rows)
    }
}

fn read_event(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn collect_events(
    rows: impl Iterator<Item = rusqlite::Result<(i64, String, String, String)>>,
) -> DbResult<Vec<StatusEvent>> {
    rows.map(|row| {
        let (seq, payload, prev_hash, hash) = row?;
        let change: StatusChange = serde_json::from_str(&payload)?;
        Ok(StatusEvent {
            seq,
            change,
            prev_hash,
            hash,
        })
    })
    .collect()
}
