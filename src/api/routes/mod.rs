//! API route handlers

pub mod expenses;
pub mod export;
pub mod session;
pub mod users;
pub mod vacations;
pub mod work_hours;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::server::SharedState;
use crate::error::{Error, Result};
use crate::records::validate::present;
use crate::records::User;
use crate::store::Store;

pub const SERVICE_NAME: &str = "workhours";

// Health check

pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "service": SERVICE_NAME, "db": true })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "service": SERVICE_NAME,
                    "db": false,
                    "error": "db_unreachable",
                })),
            )
        }
    }
}

// Shared request types

/// Body of the delete-by-id routes
#[derive(Debug, Default, Deserialize)]
pub struct IdRequest {
    pub id: Option<String>,
}

impl IdRequest {
    pub fn parse(&self) -> Result<Uuid> {
        let id = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Validation("id is required".to_string()))?;
        Uuid::parse_str(id).map_err(|_| Error::Validation("id must be a UUID".to_string()))
    }
}

/// The user a manager route acts on, named by id or by username
#[derive(Debug, Default, Deserialize)]
pub struct TargetRequest {
    #[serde(alias = "uid")]
    pub user_id: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKey {
    Id(Uuid),
    Username(String),
}

impl TargetRequest {
    /// Check the target is named in a usable form. `user_id` wins when both are given.
    pub fn key(&self) -> Result<TargetKey> {
        if present(&self.user_id) {
            let raw = self.user_id.as_deref().unwrap_or_default().trim();
            return Uuid::parse_str(raw)
                .map(TargetKey::Id)
                .map_err(|_| Error::Validation("user_id must be a UUID".to_string()));
        }
        if present(&self.username) {
            let name = self.username.as_deref().unwrap_or_default().trim();
            return Ok(TargetKey::Username(name.to_string()));
        }
        Err(Error::Validation(
            "username (preferred) or user_id is required".to_string(),
        ))
    }
}

/// Look up the user a manager route targets
pub async fn resolve_target(store: &dyn Store, key: TargetKey) -> Result<User> {
    let user = match key {
        TargetKey::Id(id) => store.find_user(id).await?,
        TargetKey::Username(name) => store
            .find_user_by_username(&name)
            .await?
            .map(|record| record.user),
    };
    user.ok_or(Error::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_request() {
        let id = Uuid::new_v4();
        let req = IdRequest {
            id: Some(id.to_string()),
        };
        assert_eq!(req.parse().unwrap(), id);

        assert!(IdRequest { id: None }.parse().is_err());
        assert!(IdRequest {
            id: Some("42".to_string())
        }
        .parse()
        .is_err());
    }

    #[test]
    fn test_target_key() {
        let id = Uuid::new_v4();
        let both = TargetRequest {
            user_id: Some(id.to_string()),
            username: Some("alice".to_string()),
        };
        assert_eq!(both.key().unwrap(), TargetKey::Id(id));

        let by_name = TargetRequest {
            user_id: None,
            username: Some(" alice ".to_string()),
        };
        assert_eq!(by_name.key().unwrap(), TargetKey::Username("alice".to_string()));

        assert!(TargetRequest::default().key().is_err());
        assert!(TargetRequest {
            user_id: Some("not-a-uuid".to_string()),
            username: None,
        }
        .key()
        .is_err());
    }
}
