//! Appointment database operations.
//!
//! Every status change is a guarded update: the `WHERE` clause restates the
//! expected current status (and the pinned vet or owner where relevant), and
//! the affected-row count tells the caller whether the row was still in that
//! state. No lock is taken around these statements.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{column_instant, column_instant_opt, Database, DbError, DbResult};
use crate::models::{
    timestamp, Appointment, AppointmentFilter, AppointmentStatus, AppointmentTab,
    AppointmentView, ServiceType, VetFilter,
};

const VIEW_SELECT: &str = r#"
    SELECT a.id, a.pet_id, a.owner_id, a.vet_id, a.start_time, a.end_time,
           a.status, a.service_type, a.owner_note, a.created_at, a.updated_at,
           p.name, o.full_name, o.email, o.phone, v.full_name
    FROM appointments a
    LEFT JOIN pets p ON p.id = a.pet_id
    LEFT JOIN profiles o ON o.id = a.owner_id
    LEFT JOIN profiles v ON v.id = a.vet_id
"#;

/// Owner edits to a still-pending appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentPatch {
    pub pet_id: String,
    pub service_type: ServiceType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub owner_note: Option<String>,
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, pet_id, owner_id, vet_id, start_time, end_time, status,
                service_type, owner_note, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                appt.id,
                appt.pet_id,
                appt.owner_id,
                appt.vet_id,
                timestamp(&appt.start_time),
                appt.end_time.as_ref().map(timestamp),
                appt.status.as_str(),
                appt.service_type.as_str(),
                appt.owner_note,
                appt.created_at,
                appt.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.get_appointment_view(id)
            .map(|view| view.map(|v| v.appointment))
    }

    /// Get an appointment with its display names.
    pub fn get_appointment_view(&self, id: &str) -> DbResult<Option<AppointmentView>> {
        let sql = format!("{VIEW_SELECT} WHERE a.id = ?");
        self.conn
            .query_row(&sql, [id], AppointmentRow::read)
            .optional()?
            .map(AppointmentView::try_from)
            .transpose()
    }

    /// Claim an unassigned pending appointment for `vet_id`.
    ///
    /// One conditional statement; returns `false` when another vet got there
    /// first or the row left `pending`. Callers must not retry.
    pub fn claim_appointment(&self, id: &str, vet_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET vet_id = ?1, status = 'confirmed', updated_at = ?2
            WHERE id = ?3 AND vet_id IS NULL AND status = 'pending'
            "#,
            params![vet_id, timestamp(&now), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Confirm a pending appointment already pinned to `vet_id`.
    pub fn accept_assigned_appointment(
        &self,
        id: &str,
        vet_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET status = 'confirmed', updated_at = ?1
            WHERE id = ?2 AND vet_id = ?3 AND status = 'pending'
            "#,
            params![timestamp(&now), id, vet_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Move an appointment from `from` to `to` if it is still in `from`.
    pub fn set_appointment_status(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), timestamp(&now), id, from.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Owner cancellation: still in `from`, owned by `owner_id` and not yet started.
    pub fn cancel_owned_appointment(
        &self,
        id: &str,
        owner_id: &str,
        from: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let now = timestamp(&now);
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET status = 'cancelled', updated_at = ?1
            WHERE id = ?2 AND owner_id = ?3 AND status = ?4 AND start_time > ?1
            "#,
            params![now, id, owner_id, from.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Apply owner edits while the appointment is still pending.
    pub fn update_pending_appointment(
        &self,
        id: &str,
        owner_id: &str,
        patch: &AppointmentPatch,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        if let Some(end) = patch.end_time {
            if end <= patch.start_time {
                return Err(DbError::Constraint(
                    "End time must be after start time".into(),
                ));
            }
        }
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                pet_id = ?1,
                service_type = ?2,
                start_time = ?3,
                end_time = ?4,
                owner_note = ?5,
                updated_at = ?6
            WHERE id = ?7 AND owner_id = ?8 AND status = 'pending'
            "#,
            params![
                patch.pet_id,
                patch.service_type.as_str(),
                timestamp(&patch.start_time),
                patch.end_time.as_ref().map(timestamp),
                patch.owner_note,
                timestamp(&now),
                id,
                owner_id,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Vet dashboard tab.
    ///
    /// `upcoming` includes the open pool of unassigned pending appointments
    /// alongside the vet's own.
    pub fn list_vet_appointments(
        &self,
        vet_id: &str,
        tab: AppointmentTab,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<AppointmentView>> {
        let mut query = ViewQuery::default();
        let now = Value::Text(timestamp(&now));
        let vet = Value::Text(vet_id.to_string());
        match tab {
            AppointmentTab::Upcoming => {
                query.push("a.status IN ('pending', 'confirmed')", []);
                query.push("a.start_time >= ?", [now]);
                query.push(
                    "(a.vet_id = ? OR (a.vet_id IS NULL AND a.status = 'pending'))",
                    [vet],
                );
            }
            AppointmentTab::Past => {
                query.push("a.vet_id = ?", [vet]);
                query.push("(a.start_time < ? OR a.status = 'completed')", [now]);
            }
            AppointmentTab::Cancelled => {
                query.push("a.vet_id = ?", [vet]);
                query.push("a.status IN ('cancelled', 'rejected')", []);
            }
        }
        self.query_views(&query, tab_order(tab))
    }

    /// Owner dashboard tab with optional filters.
    pub fn list_owner_appointments(
        &self,
        owner_id: &str,
        tab: AppointmentTab,
        filter: &AppointmentFilter,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<AppointmentView>> {
        let mut query = ViewQuery::default();
        let now = Value::Text(timestamp(&now));
        query.push("a.owner_id = ?", [Value::Text(owner_id.to_string())]);
        match tab {
            AppointmentTab::Upcoming => {
                query.push("a.status IN ('pending', 'confirmed')", []);
                query.push("a.start_time >= ?", [now]);
            }
            AppointmentTab::Past => {
                query.push("(a.start_time < ? OR a.status = 'completed')", [now]);
            }
            AppointmentTab::Cancelled => {
                query.push("a.status IN ('cancelled', 'rejected')", []);
            }
        }
        query.apply_filter(filter);
        self.query_views(&query, tab_order(tab))
    }

    /// Admin list over every appointment, newest start first.
    pub fn list_all_appointments(&self, filter: &AppointmentFilter) -> DbResult<Vec<AppointmentView>> {
        let mut query = ViewQuery::default();
        query.apply_filter(filter);
        self.query_views(&query, "a.start_time DESC")
    }

    fn query_views(&self, query: &ViewQuery, order: &str) -> DbResult<Vec<AppointmentView>> {
        let sql = format!("{VIEW_SELECT} {} ORDER BY {order}", query.where_sql());
        tracing::debug!(sql = %sql, params = query.values.len(), "appointment query");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(query.values.iter()), AppointmentRow::read)?;

        rows.map(|row| AppointmentView::try_from(row?)).collect()
    }
}

fn tab_order(tab: AppointmentTab) -> &'static str {
    match tab {
        AppointmentTab::Past => "a.start_time DESC",
        AppointmentTab::Upcoming | AppointmentTab::Cancelled => "a.start_time ASC",
    }
}

/// UTC midnight at the start of `day`, in storage format.
fn day_start(day: NaiveDate) -> String {
    timestamp(&day.and_time(NaiveTime::MIN).and_utc())
}

/// Accumulated `WHERE` predicates and their bound values.
#[derive(Default)]
struct ViewQuery {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl ViewQuery {
    fn push<const N: usize>(&mut self, clause: &str, values: [Value; N]) {
        self.clauses.push(clause.to_string());
        self.values.extend(values);
    }

    fn apply_filter(&mut self, filter: &AppointmentFilter) {
        if let Some(pet_id) = &filter.pet_id {
            self.push("a.pet_id = ?", [Value::Text(pet_id.clone())]);
        }
        if let Some(service) = filter.service_type {
            self.push("a.service_type = ?", [Value::Text(service.as_str().into())]);
        }
        if let Some(status) = filter.status {
            self.push("a.status = ?", [Value::Text(status.as_str().into())]);
        }
        if let Some(from) = filter.from_date {
            self.push("a.start_time >= ?", [Value::Text(day_start(from))]);
        }
        // Inclusive: everything before the following midnight
        if let Some(next) = filter.to_date.and_then(|to| to.checked_add_days(Days::new(1))) {
            self.push("a.start_time < ?", [Value::Text(day_start(next))]);
        }
        match filter.vet {
            VetFilter::Any => {}
            VetFilter::Unassigned => self.push("a.vet_id IS NULL", []),
            VetFilter::Assigned => self.push("a.vet_id IS NOT NULL", []),
        }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Raw appointment row plus joined names.
struct AppointmentRow {
    id: String,
    pet_id: String,
    owner_id: String,
    vet_id: Option<String>,
    start_time: String,
    end_time: Option<String>,
    status: String,
    service_type: String,
    owner_note: Option<String>,
    created_at: String,
    updated_at: String,
    pet_name: Option<String>,
    owner_name: Option<String>,
    owner_email: Option<String>,
    owner_phone: Option<String>,
    vet_name: Option<String>,
}

impl AppointmentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pet_id: row.get(1)?,
            owner_id: row.get(2)?,
            vet_id: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            status: row.get(6)?,
            service_type: row.get(7)?,
            owner_note: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            pet_name: row.get(11)?,
            owner_name: row.get(12)?,
            owner_email: row.get(13)?,
            owner_phone: row.get(14)?,
            vet_name: row.get(15)?,
        })
    }
}

impl TryFrom<AppointmentRow> for AppointmentView {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown appointment status: {}", row.status))
        })?;
        let service_type = ServiceType::parse(&row.service_type).ok_or_else(|| {
            DbError::Constraint(format!("Unknown service type: {}", row.service_type))
        })?;

        Ok(AppointmentView {
            appointment: Appointment {
                id: row.id,
                pet_id: row.pet_id,
                owner_id: row.owner_id,
                vet_id: row.vet_id,
                start_time: column_instant(&row.start_time)?,
                end_time: column_instant_opt(row.end_time)?,
                status,
                service_type,
                owner_note: row.owner_note,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            pet_name: row.pet_name,
            owner_name: row.owner_name,
            owner_email: row.owner_email,
            owner_phone: row.owner_phone,
            vet_name: row.vet_name,
        })
    }
}
