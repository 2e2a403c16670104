/**
 * Connection Registry
 *
 * This module tracks live socket connections: which user owns each one and
 * which rooms each one is subscribed to.
 *
 * # Architecture
 *
 * Three indices sit behind a single `std::sync::Mutex`:
 * - connection → (handle, owning user, subscribed rooms)
 * - room → connections
 * - user → connections
 *
 * Every mutation takes the lock once, updates all affected indices, and
 * releases it before returning. Reads copy what they need out of the lock
 * (`subscribers_of`, `connections_of`) so callers iterate over a snapshot
 * that later subscribes and unsubscribes cannot disturb.
 *
 * The lock is never held across an `.await`; all methods are synchronous.
 *
 * # Membership
 *
 * The registry does not know who may join a room. The session protocol
 * checks membership before calling `subscribe`.
 */
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::shared::event::ServerEvent;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Frames a connection may have queued before new ones are dropped
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// A frame could not be queued for a connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The writer side has gone away
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// The client is not draining its queue
    #[error("connection {0} outbound queue is full")]
    Full(ConnectionId),
}

/// Handle used to push text frames to one connection
///
/// Cloning is cheap; every clone feeds the same bounded outbound queue. The
/// queue is drained by the connection's writer task. Frames pushed while it
/// is full are dropped with `DeliveryError::Full`.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its writer task should drain
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::next(),
                outbound,
            },
            receiver,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an already serialized frame
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        self.outbound
            .try_send(text.into())
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full(self.id),
                TrySendError::Closed(_) => DeliveryError::Closed(self.id),
            })
    }

    /// Serialize and queue an event
    ///
    /// An event that fails to serialize is logged and dropped; the
    /// connection itself is still considered open.
    pub fn send(&self, event: &ServerEvent) -> Result<(), DeliveryError> {
        match event.to_json() {
            Ok(text) => self.send_text(text),
            Err(e) => {
                tracing::error!(connection_id = %self.id, "[Registry] Failed to serialize event: {}", e);
                Ok(())
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

struct ConnectionEntry {
    handle: ConnectionHandle,
    user_id: String,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct Indices {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
    users: HashMap<String, HashSet<ConnectionId>>,
}

impl Indices {
    fn handles<'a>(&self, ids: impl Iterator<Item = &'a ConnectionId>) -> Vec<ConnectionHandle> {
        ids.filter_map(|id| self.connections.get(id))
            .map(|entry| entry.handle.clone())
            .collect()
    }
}

/// Registry of live connections and their room subscriptions
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<Indices>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Indices> {
        // Every critical section leaves the indices consistent, so a panic
        // elsewhere does not invalidate them.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bind a freshly authenticated connection to its user
    ///
    /// Registering the same connection again for the same user is a no-op.
    /// The owning user never changes once set.
    ///
    /// # Returns
    /// `false` if the connection is already bound to a different user
    pub fn register(&self, handle: ConnectionHandle, user_id: &str) -> bool {
        let id = handle.id();
        let mut indices = self.lock();

        if let Some(existing) = indices.connections.get(&id) {
            if existing.user_id != user_id {
                tracing::warn!(
                    connection_id = %id,
                    user_id = %user_id,
                    owner = %existing.user_id,
                    "[Registry] Refusing to rebind connection to another user"
                );
                return false;
            }
            return true;
        }

        indices.connections.insert(
            id,
            ConnectionEntry {
                handle,
                user_id: user_id.to_string(),
                rooms: HashSet::new(),
            },
        );
        indices
            .users
            .entry(user_id.to_string())
            .or_default()
            .insert(id);

        tracing::info!(connection_id = %id, user_id = %user_id, "[Registry] Connection registered");
        true
    }

    /// Remove a connection from every index
    ///
    /// Safe to call more than once and for connections that were never
    /// registered.
    pub fn unregister(&self, id: ConnectionId) {
        let mut indices = self.lock();
        let Some(entry) = indices.connections.remove(&id) else {
            return;
        };

        for room_id in &entry.rooms {
            if let Some(subscribers) = indices.rooms.get_mut(room_id) {
                subscribers.remove(&id);
                if subscribers.is_empty() {
                    indices.rooms.remove(room_id);
                }
            }
        }

        if let Some(connections) = indices.users.get_mut(&entry.user_id) {
            connections.remove(&id);
            if connections.is_empty() {
                indices.users.remove(&entry.user_id);
            }
        }

        tracing::info!(
            connection_id = %id,
            user_id = %entry.user_id,
            rooms = entry.rooms.len(),
            "[Registry] Connection unregistered"
        );
    }

    /// Add a connection to a room's subscriber set
    ///
    /// # Returns
    /// `false` if the connection is not registered
    pub fn subscribe(&self, id: ConnectionId, room_id: &str) -> bool {
        let mut indices = self.lock();
        let Some(entry) = indices.connections.get_mut(&id) else {
            return false;
        };

        if entry.rooms.insert(room_id.to_string()) {
            indices
                .rooms
                .entry(room_id.to_string())
                .or_default()
                .insert(id);
            tracing::debug!(connection_id = %id, room_id = %room_id, "[Registry] Subscribed");
        }
        true
    }

    /// Remove a connection from a room; empty rooms are dropped
    pub fn unsubscribe(&self, id: ConnectionId, room_id: &str) {
        let mut indices = self.lock();

        if let Some(entry) = indices.connections.get_mut(&id) {
            entry.rooms.remove(room_id);
        }

        if let Some(subscribers) = indices.rooms.get_mut(room_id) {
            if subscribers.remove(&id) {
                tracing::debug!(connection_id = %id, room_id = %room_id, "[Registry] Unsubscribed");
            }
            if subscribers.is_empty() {
                indices.rooms.remove(room_id);
            }
        }
    }

    /// Snapshot of the connections subscribed to a room
    pub fn subscribers_of(&self, room_id: &str) -> Vec<ConnectionHandle> {
        let indices = self.lock();
        match indices.rooms.get(room_id) {
            Some(ids) => indices.handles(ids.iter()),
            None => Vec::new(),
        }
    }

    /// Snapshot of a user's live connections
    pub fn connections_of(&self, user_id: &str) -> Vec<ConnectionHandle> {
        let indices = self.lock();
        match indices.users.get(user_id) {
            Some(ids) => indices.handles(ids.iter()),
            None => Vec::new(),
        }
    }

    /// Rooms a connection is subscribed to, sorted
    pub fn rooms_of(&self, id: ConnectionId) -> Vec<String> {
        let indices = self.lock();
        let mut rooms: Vec<String> = indices
            .connections
            .get(&id)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// Owning user of a connection
    pub fn user_of(&self, id: ConnectionId) -> Option<String> {
        self.lock().connections.get(&id).map(|e| e.user_id.clone())
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.lock().connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Rooms with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }
}
