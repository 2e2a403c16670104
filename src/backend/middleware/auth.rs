/**
 * Authentication Middleware
 *
 * This module protects the `/chat` HTTP routes. It resolves the bearer
 * credential from the `Authorization` header to a user and attaches that
 * user to the request extensions for handlers.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::backend::auth::{extract_bearer, resolve_credential};
use crate::backend::error::ChatError;
use crate::backend::server::state::AppState;
use crate::backend::store::User;

/// User resolved by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the bearer credential from the Authorization header
/// 2. Resolves it to an active user
/// 3. Attaches the user to request extensions
///
/// Returns 401 with the standard error body when any step fails.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ChatError> {
    let credential = extract_bearer(request.headers());

    let user = resolve_credential(
        state.chat.stores().users.as_ref(),
        state.config.jwt_secret.as_deref(),
        credential.as_deref(),
    )
    .await
    .inspect_err(|e| {
        tracing::warn!(path = %request.uri().path(), "[Auth] Rejected request: {}", e);
    })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Only valid on routes behind `auth_middleware`; elsewhere it rejects
/// with 401.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|AuthenticatedUser(user)| AuthUser(user.clone()))
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                ChatError::authentication("Not authenticated")
            })
    }
}
