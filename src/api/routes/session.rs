//! Login and identity routes

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::auth::password::verify_password_blocking;
use crate::auth::{CurrentUser, Identity, LoginRequest, LoginResponse};
use crate::error::{Error, Result};
use crate::records::validate::{present, require_fields};

/// `POST /api/login`: exchange a username and password for a session token.
///
/// Unknown usernames and wrong passwords fail with the same error.
pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    require_fields(&[
        ("username", present(&req.username)),
        ("password", present(&req.password)),
    ])?;

    if !state.tokens.is_configured() {
        return Err(Error::Misconfigured("JWT_SECRET missing".to_string()));
    }

    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let record = state.store.find_user_by_username(&username).await?;
    let hash = record.as_ref().map(|r| r.password_hash.clone());
    if !verify_password_blocking(password, hash).await {
        tracing::warn!(user = %username, "failed login");
        return Err(Error::InvalidCredentials);
    }
    let user = record.ok_or(Error::InvalidCredentials)?.user;

    let identity = Identity {
        id: user.id,
        username: user.username,
        role: user.role,
    };
    let token = state.tokens.issue(&identity)?;
    tracing::info!(user = %identity.username, role = %identity.role, "login");

    Ok(Json(LoginResponse {
        ok: true,
        token,
        role: identity.role,
        username: identity.username,
    }))
}

/// `GET /api/me`
pub async fn me(user: CurrentUser) -> Json<Value> {
    Json(json!({ "ok": true, "user": user.identity() }))
}
