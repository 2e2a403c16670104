//! Taskchat - Main Library
//!
//! Taskchat is the real-time chat core of a task and project collaboration
//! backend. Every project group is a chat room; members exchange text,
//! media, file and task messages over a WebSocket session or plain HTTP.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared by both transports
//!   - Socket frames and server events
//!   - The canonical message payload and message kinds
//!   - Error types for decoding and validation
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server and WebSocket session protocol
//!   - Connection registry and room broadcaster
//!   - Shared ingestion routine and canonical serialization
//!   - SQLite persistence through `sqlx`
//!
//! # Usage
//!
//! ```rust,no_run
//! use taskchat::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::default()).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Delivery Model
//!
//! Broadcasts are best effort and at most once per live subscribed
//! connection. History is the recovery path for anything missed while
//! disconnected.
//!
//! # Error Handling
//!
//! - `shared::SharedError` for wire-level failures
//! - `backend::store::StoreError` for persistence failures
//! - `backend::error::ChatError` for everything a client can see

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
