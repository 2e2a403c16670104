//! Real-time Module
//!
//! This module holds the in-process state for live socket connections and the
//! fan-out built on top of it.
//!
//! # Architecture
//!
//! - **`registry`** - `ConnectionRegistry`, the only shared mutable state of
//!   the chat core, plus `ConnectionHandle` (one per socket)
//! - **`broadcast`** - `RoomBroadcaster`, best-effort delivery to a room or a
//!   user
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs        - Module exports and documentation
//! ├── registry.rs   - Connection and subscription indices
//! └── broadcast.rs  - Room and user fan-out
//! ```
//!
//! Both types are created once in `create_app` and injected through
//! `AppState`; tests build isolated instances freely.

/// Connection and subscription tracking
pub mod registry;

/// Room and user fan-out
pub mod broadcast;

pub use broadcast::RoomBroadcaster;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError};
