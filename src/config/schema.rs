//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where records are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// A `postgres://` connection string, or `memory` for a throwaway
    /// in-process store
    #[serde(default = "default_database_url")]
    pub url: String,
}

pub const MEMORY_DATABASE_URL: &str = "memory";

fn default_database_url() -> String {
    MEMORY_DATABASE_URL.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.trim() == MEMORY_DATABASE_URL
    }
}

/// Token signing and password hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl AuthConfig {
    /// The signing secret, treating a blank value (e.g. an unset `${JWT_SECRET}`) as missing
    pub fn secret(&self) -> Option<&str> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_memory());
        assert!(config.auth.secret().is_none());
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_blank_secret_is_unset() {
        let auth = AuthConfig {
            jwt_secret: Some("   ".to_string()),
            bcrypt_cost: 4,
        };
        assert!(auth.secret().is_none());

        let auth = AuthConfig {
            jwt_secret: Some("s3cret".to_string()),
            bcrypt_cost: 4,
        };
        assert_eq!(auth.secret(), Some("s3cret"));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.secret(), Some("abc"));
        assert!(config.database.is_memory());
    }
}
