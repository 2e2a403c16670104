//! Authentication Module
//!
//! This module resolves bearer credentials to users. It does not issue
//! credentials or manage accounts; those belong to the wider application.
//!
//! # Architecture
//!
//! - **`sessions`** - HS256 JWT encoding and validation
//! - **`credentials`** - bearer extraction and user resolution
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── sessions.rs     - JWT token helpers
//! └── credentials.rs  - Credential → user resolution
//! ```
//!
//! # Authentication Flow
//!
//! 1. **HTTP**: `auth_middleware` reads the `Authorization` header, resolves
//!    the user and stores it in request extensions.
//! 2. **Socket**: the upgrade handler reads the `token` query parameter (or
//!    the header) and passes it to the session handshake, which resolves it
//!    the same way.

/// JWT token generation and validation
pub mod sessions;

/// Credential resolution
pub mod credentials;

pub use credentials::{extract_bearer, resolve_credential};
pub use sessions::{create_token, verify_token, Claims, TOKEN_TTL_SECS};
