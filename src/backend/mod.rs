//! Backend Module
//!
//! This module contains all server-side code of the chat core: the Axum
//! server, the socket session protocol, room fan-out and the store seams.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`chat`** - Chat service, ingestion, serialization, socket session
//! - **`realtime`** - Connection registry and room broadcaster
//! - **`store`** - Persistence capabilities (SQLite and in-memory)
//! - **`auth`** - Credential resolution and JWT helpers
//! - **`middleware`** - Request authentication
//! - **`error`** - `ChatError` and its HTTP conversion
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── chat/           - Chat core
//! ├── realtime/       - Registry and broadcaster
//! ├── store/          - Persistence
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Thread Safety
//!
//! - The registry is a single `std::sync::Mutex` never held across `.await`
//! - Stores are `Arc<dyn Trait + Send + Sync>`
//! - Each socket owns a bounded outbound queue drained by its writer task

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Chat core
pub mod chat;

/// Connection registry and room fan-out
pub mod realtime;

/// Persistence capabilities
pub mod store;

/// Backend error types
pub mod error;

/// Authentication
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use chat::ChatService;
pub use error::{ChatError, ChatResult};
pub use realtime::{ConnectionRegistry, RoomBroadcaster};
pub use server::{create_app, create_app_with_stores, AppState, ServerConfig};
