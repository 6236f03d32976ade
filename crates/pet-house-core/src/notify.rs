//! Realtime fan-out of notification inserts.
//!
//! Stands in for the hosted realtime channel: a client subscribes to insert
//! events on `notifications` filtered to its own `user_id`, and refreshes its
//! list when one arrives.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::Notification;

const CHANNEL_CAPACITY: usize = 64;

/// Broadcast hub for notification inserts, one channel per recipient.
#[derive(Debug, Default)]
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<Notification>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to inserts for `user_id`. Creates the channel if needed.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<Notification> {
        let sender = self
            .channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish an inserted notification. No-op if nobody is listening.
    pub fn publish(&self, notification: &Notification) {
        if let Some(sender) = self.channels.get(&notification.user_id) {
            let delivered = sender.send(notification.clone()).unwrap_or(0);
            tracing::debug!(
                user_id = %notification.user_id,
                delivered,
                "notification published"
            );
        }
    }

    /// Drop the channel for `user_id` once nobody holds a receiver for it.
    ///
    /// Returns whether the channel was dropped.
    pub fn release_if_idle(&self, user_id: &str) -> bool {
        self.channels
            .remove_if(user_id, |_, sender| sender.receiver_count() == 0)
            .is_some()
    }

    /// Number of users with an open channel.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
