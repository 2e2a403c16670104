/**
 * Credential Resolution
 *
 * Turns a bearer credential into an active user.
 *
 * # Resolution Order
 *
 * 1. If a JWT secret is configured and the credential verifies as a token,
 *    its `sub` claim is the lookup key; otherwise the credential itself is.
 * 2. The key is tried as a user id, then a username, then an email. The
 *    first match wins.
 * 3. The matched user must be active.
 *
 * Every failure maps to `ChatError::Authentication`, whatever the cause.
 */

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::{ChatError, ChatResult};
use crate::backend::store::{User, UserDirectory};

/// Extract the credential from an `Authorization: Bearer ...` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve a credential to an active user
///
/// # Arguments
/// * `users` - User lookup capability
/// * `jwt_secret` - Secret for signed tokens, if any
/// * `credential` - Raw credential from the query string or header
///
/// # Returns
/// The active user, or `ChatError::Authentication`
pub async fn resolve_credential(
    users: &dyn UserDirectory,
    jwt_secret: Option<&str>,
    credential: Option<&str>,
) -> ChatResult<User> {
    let credential = credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ChatError::authentication("Missing credential"))?;

    let lookup_key = match jwt_secret.map(|secret| verify_token(secret, credential)) {
        Some(Ok(claims)) => claims.sub,
        _ => credential.to_string(),
    };

    let user = match users.find_user_by_id(&lookup_key).await? {
        Some(user) => Some(user),
        None => match users.find_user_by_username(&lookup_key).await? {
            Some(user) => Some(user),
            None => users.find_user_by_email(&lookup_key).await?,
        },
    };

    let Some(user) = user else {
        tracing::warn!("[Auth] Credential did not resolve to a user");
        return Err(ChatError::authentication("Invalid credential"));
    };

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "[Auth] Inactive account rejected");
        return Err(ChatError::authentication("Account is disabled"));
    }

    Ok(user)
}
