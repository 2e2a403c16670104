//! Middleware Module
//!
//! HTTP middleware for the backend router.
//!
//! - **`auth`** - bearer authentication for `/chat` routes

/// Authentication middleware and extractor
pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
