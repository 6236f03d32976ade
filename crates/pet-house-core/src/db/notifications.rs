//! Notification database operations.

use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::Notification;

impl Database {
    /// Insert a notification and publish it to the recipient's channel.
    pub fn insert_notification(&self, notification: &Notification) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO notifications (id, user_id, title, message, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                notification.id,
                notification.user_id,
                notification.title,
                notification.message,
                notification.is_read,
                notification.created_at,
            ],
        )?;
        self.hub.publish(notification);
        Ok(())
    }

    /// A user's notifications, newest first.
    pub fn list_notifications(&self, user_id: &str) -> DbResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([user_id], read_notification)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Mark one of the user's notifications read.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? AND is_read = 0",
            [id, user_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark all of the user's notifications read. Returns how many changed.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
            [user_id],
        )?;
        Ok(rows_affected)
    }

    /// Number of unread notifications for the user.
    pub fn unread_notification_count(&self, user_id: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn read_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        is_read: row.get(4)?,
        created_at: row.get(5)?,
    })
}
