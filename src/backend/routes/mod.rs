//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! ├── chat_routes.rs  - `/chat` routes and the socket upgrade
//! └── api_routes.rs   - Service info and health
//! ```
//!
//! # Route Types
//!
//! ## Chat Routes (authenticated)
//!
//! - `GET /chat/rooms`
//! - `GET|POST /chat/rooms/{room_id}/messages`
//! - `DELETE /chat/rooms/{room_id}/messages/{message_id}`
//! - `POST /chat/rooms/{room_id}/read`
//!
//! ## Socket
//!
//! - `GET /chat/ws?token=&room_id=` - authenticates during its handshake
//!
//! ## API Routes (public)
//!
//! - `GET /`
//! - `GET /health`

/// Main router creation
pub mod router;

/// Chat-related routes
pub mod chat_routes;

/// Service endpoints
pub mod api_routes;

pub use router::create_router;
