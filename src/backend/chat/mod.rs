//! Chat Backend Module
//!
//! The chat core: room access, message ingestion, canonical serialization,
//! the socket session protocol and the HTTP handlers that expose it.
//!
//! # Architecture
//!
//! - **`service`** - `ChatService`: room access, room list, history, delete, read
//! - **`ingest`** - the validate → persist → serialize → broadcast routine
//! - **`serialize`** - stored row → `ChatMessagePayload`
//! - **`session`** - per-socket protocol state machine
//! - **`socket`** - WebSocket upgrade and reader/writer tasks
//! - **`handlers`** - `/chat` HTTP routes
//!
//! # Dual Path
//!
//! `POST /chat/rooms/{room_id}/messages` and the socket `send_message`
//! frame both call `ChatService::send_message`. Both paths therefore apply
//! the same checks and broadcast the same payload shape.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskchat::backend::chat::ChatService;
//! use taskchat::backend::realtime::{ConnectionRegistry, RoomBroadcaster};
//! use taskchat::backend::store::{MemoryStore, Stores};
//! use taskchat::shared::SendMessageBody;
//!
//! # async fn example(sender: taskchat::backend::store::User) {
//! let registry = Arc::new(ConnectionRegistry::new());
//! let chat = ChatService::new(
//!     Stores::from_shared(Arc::new(MemoryStore::new())),
//!     RoomBroadcaster::new(registry),
//! );
//! let payload = chat
//!     .send_message(&sender, "g1", SendMessageBody::text("hello"))
//!     .await;
//! # }
//! ```

/// Room-level chat operations
pub mod service;

/// Shared message ingestion
pub mod ingest;

/// Canonical message serialization
pub mod serialize;

/// Socket session state machine
pub mod session;

/// WebSocket transport
pub mod socket;

/// HTTP route handlers
pub mod handlers;

pub use service::{ChatService, HistoryResponse, RoomSummary};
pub use session::{ChatSession, Flow, Handshake, SessionState};
