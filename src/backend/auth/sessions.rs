/**
 * Signed Session Tokens
 *
 * HS256 JWT encoding and validation. Issuing tokens is not part of the chat
 * core; `create_token` exists for tests and local tooling. The server only
 * ever verifies.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime: 30 days
pub const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Lookup key: a user id, username or email
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `secret` - HMAC secret
/// * `subject` - Value placed in `sub`
/// * `ttl_secs` - Lifetime in seconds
///
/// # Returns
/// JWT token string
pub fn create_token(
    secret: &str,
    subject: &str,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        exp: u64::try_from(now + ttl_secs).unwrap_or_default(),
        iat: u64::try_from(now).unwrap_or_default(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify and decode a JWT token
///
/// # Arguments
/// * `secret` - HMAC secret
/// * `token` - JWT token string
///
/// # Returns
/// Decoded claims or error
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}
