//! Authentication middleware and extractors

use crate::api::SharedState;
use crate::auth::Identity;
use crate::error::{Error, Result};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Pull the credential out of an `Authorization: Bearer <token>` header.
///
/// The header must be exactly two space-separated parts with the `Bearer`
/// scheme; anything else counts as no credential at all.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Verify the request's bearer token and return the identity it carries
pub fn authenticate(state: &SharedState, headers: &HeaderMap) -> Result<Identity> {
    // Fail closed before looking at the request when no secret is set
    if !state.tokens.is_configured() {
        return Err(Error::Misconfigured("JWT_SECRET missing".to_string()));
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_bearer)
        .ok_or(Error::MissingCredential)?;

    state.tokens.verify(token)
}

/// Middleware for requiring authentication.
///
/// Attaches the verified [`Identity`] to the request extensions.
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let identity = authenticate(&state, req.headers())?;
    tracing::debug!(user = %identity.username, role = %identity.role, "authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Middleware for manager-only routes. Must be layered inside [`require_auth`].
pub async fn require_manager(req: Request, next: Next) -> std::result::Result<Response, Error> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| Error::Internal("auth middleware not applied".to_string()))?;

    if !identity.is_manager() {
        return Err(Error::Forbidden("Manager access required".to_string()));
    }

    Ok(next.run(req).await)
}

/// The acting user, as established by [`require_auth`].
///
/// Every handler that works on "own" records takes the owner from here and
/// nowhere else.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| Error::Internal("auth middleware not applied".to_string()))
    }
}
