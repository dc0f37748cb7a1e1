//! JWT token handling

use crate::auth::models::{Identity, UserRole};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session tokens are valid for this many days after issuance
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Issued at
    pub iat: i64,
    /// Expiration time (7 days after `iat`)
    pub exp: i64,
}

impl Claims {
    /// Create claims for an identity issued at `issued_at`
    pub fn for_identity(identity: &Identity, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
            iat,
            exp: (issued_at + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        }
    }
}

impl TryFrom<Claims> for Identity {
    type Error = Error;

    fn try_from(claims: Claims) -> Result<Self> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidToken)?;
        Ok(Identity {
            id,
            username: claims.username,
            role: claims.role,
        })
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies session tokens with a server-held HMAC secret.
///
/// A codec built without a secret refuses every operation with
/// [`Error::Misconfigured`].
pub struct TokenCodec {
    keys: Option<SigningKeys>,
}

impl TokenCodec {
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| SigningKeys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });
        Self { keys }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> Result<&SigningKeys> {
        self.keys
            .as_ref()
            .ok_or_else(|| Error::Misconfigured("JWT_SECRET missing".to_string()))
    }

    /// Create a token for `identity`, valid for [`TOKEN_LIFETIME_DAYS`]
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Create a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String> {
        let keys = self.keys()?;
        let claims = Claims::for_identity(identity, issued_at);
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &keys.encoding,
        )?)
    }

    /// Validate a token and decode the identity it carries.
    ///
    /// Malformed, tampered and expired tokens all come back as
    /// [`Error::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let keys = self.keys()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "token rejected");
                Error::InvalidToken
            })?;

        Identity::try_from(claims)
    }
}
