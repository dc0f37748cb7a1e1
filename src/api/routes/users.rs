//! Account management routes (manager only)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::accounts;
use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::records::validate::{parse_role, present, require_fields};

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// `GET /api/users`
pub async fn list(State(state): State<SharedState>) -> Result<Json<Value>> {
    let users = state.store.list_users().await?;
    Ok(Json(json!({ "ok": true, "users": users })))
}

/// `POST /api/users`
pub async fn create(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<Json<Value>> {
    require_fields(&[
        ("username", present(&req.username)),
        ("password", present(&req.password)),
        ("role", present(&req.role)),
    ])?;
    let role = parse_role(req.role.as_deref().unwrap_or_default())?;

    let user = accounts::create_account(
        state.store.as_ref(),
        req.username.as_deref().unwrap_or_default(),
        req.password.unwrap_or_default(),
        role,
        state.bcrypt_cost,
    )
    .await?;

    Ok(Json(json!({ "ok": true, "uid": user.id, "user": user })))
}

/// `DELETE /api/users/by-username/{username}`: removes the user and everything they own
pub async fn delete_by_username(
    State(state): State<SharedState>,
    manager: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>> {
    let user =
        accounts::delete_account(state.store.as_ref(), manager.identity(), &username).await?;

    Ok(Json(json!({
        "ok": true,
        "deleted": user.username,
        "uid": user.id,
    })))
}
