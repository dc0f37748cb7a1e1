//! Error types for workhours

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Missing Authorization Bearer token")]
    MissingCredential,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("User not found")]
    UserNotFound,

    #[error("{message}")]
    Conflict {
        message: String,
        existing: Option<serde_json::Value>,
    },

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'workhours init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl Error {
    /// Build a conflict error carrying the record that already occupies the key
    pub fn conflict(message: impl Into<String>, existing: impl serde::Serialize) -> Self {
        Error::Conflict {
            message: message.into(),
            existing: serde_json::to_value(existing).ok(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::MissingCredential | Error::InvalidToken | Error::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) | Error::UserNotFound => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to a client.
    ///
    /// Missing and invalid tokens render the same text. Anything that maps to a
    /// 500 is reduced to a generic message; the detail only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            Error::MissingCredential | Error::InvalidToken => {
                "Invalid or expired token".to_string()
            }
            Error::Misconfigured(_) => "Server misconfigured".to_string(),
            Error::Validation(_)
            | Error::InvalidCredentials
            | Error::Forbidden(_)
            | Error::NotFound(_)
            | Error::UserNotFound
            | Error::Conflict { .. } => self.to_string(),
            _ => "Server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = status.as_u16(), error = %self, "access denied");
        }

        let mut body = json!({
            "ok": false,
            "error": self.client_message(),
        });
        if let Error::Conflict {
            existing: Some(existing),
            ..
        } = self
        {
            body["existing"] = existing;
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
