/**
 * Room Broadcasting
 *
 * Fan-out of server events to every connection subscribed to a room, or to
 * every connection a user holds.
 *
 * # Delivery
 *
 * The event is serialized once, the subscriber set is snapshotted from the
 * registry, and each connection is tried independently. A connection whose
 * writer has gone away is logged and skipped; it stays registered until its
 * own session tears down. Neither method returns an error.
 */
use std::sync::Arc;

use crate::backend::realtime::registry::{ConnectionHandle, ConnectionRegistry};
use crate::shared::event::ServerEvent;

/// Delivers events through a shared `ConnectionRegistry`
#[derive(Clone)]
pub struct RoomBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl RoomBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Broadcast an event to all current subscribers of a room
    ///
    /// # Arguments
    /// * `room_id` - Room to deliver to
    /// * `event` - Event to deliver
    ///
    /// # Returns
    /// Number of connections the event was queued for
    pub fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        let subscribers = self.registry.subscribers_of(room_id);
        let delivered = self.deliver(&subscribers, event);
        tracing::debug!(
            room_id = %room_id,
            delivered,
            subscribers = subscribers.len(),
            "[Broadcast] Room broadcast complete"
        );
        delivered
    }

    /// Send an event to every live connection of one user
    ///
    /// # Returns
    /// Number of connections the event was queued for
    pub fn send_to_user(&self, user_id: &str, event: &ServerEvent) -> usize {
        let connections = self.registry.connections_of(user_id);
        let delivered = self.deliver(&connections, event);
        tracing::debug!(user_id = %user_id, delivered, "[Broadcast] User delivery complete");
        delivered
    }

    fn deliver(&self, targets: &[ConnectionHandle], event: &ServerEvent) -> usize {
        if targets.is_empty() {
            return 0;
        }

        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("[Broadcast] Failed to serialize event: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for handle in targets {
            match handle.send_text(text.as_str()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(connection_id = %handle.id(), "[Broadcast] Delivery failed: {}", e);
                }
            }
        }
        delivered
    }
}
