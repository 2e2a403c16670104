//! Backend Error Module
//!
//! Error types of the chat core and their HTTP conversion.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - ChatError and its status code mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! Socket sessions reuse `ChatError::status_code()` as the `code` of their
//! `error` events, so a client sees the same number on either transport.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::ChatError;

/// Result alias used across the chat core
pub type ChatResult<T> = Result<T, ChatError>;
