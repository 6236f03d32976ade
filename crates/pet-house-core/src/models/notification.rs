//! In-app notifications.

use serde::{Deserialize, Serialize};

/// A notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    /// Recipient profile ID
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(user_id: String, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title: title.into(),
            message: message.into(),
            is_read: false,
            created_at: super::now_timestamp(),
        }
    }
}
