//! Token codec: JWT generation and validation
//!
//! Access and refresh tokens are signed with HMAC-SHA256 under distinct
//! secrets and carry independent expiries. Tokens are opaque strings to
//! every other component; only this module parses their structure.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use wpt_core::config::AuthConfig;

/// Token class, each bound to its own signing secret and lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in a signed token
///
/// Access tokens carry the user's role; refresh tokens deliberately omit it
/// so they cannot double as access credentials even under the wrong secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject - user ID
    pub sub: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Unique token ID, so tokens minted in the same second still differ
    pub jti: String,
}

/// Token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies tokens with the secret bound to each [`TokenKind`]
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: AuthConfig,
}

impl TokenCodec {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.config.access_secret.as_bytes(),
            TokenKind::Refresh => self.config.refresh_secret.as_bytes(),
        }
    }

    fn expiration_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.config.access_expiration_secs as i64,
            TokenKind::Refresh => self.config.refresh_expiration_secs as i64,
        }
    }

    /// Access token lifetime, exposed for `expires_in` response fields
    pub fn access_expiration_secs(&self) -> u64 {
        self.config.access_expiration_secs
    }

    /// Sign a token of the given kind for a user
    ///
    /// Pure computation: the expiry is derived from the configured lifetime
    /// for `kind` and no state is touched.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: Option<&str>,
        kind: TokenKind,
    ) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            role: role.map(|r| r.to_string()),
            iat: now,
            exp: now + self.expiration_secs(kind),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )?;

        Ok(token)
    }

    /// Decode and check a token against the `kind`-specific secret
    ///
    /// Fails with [`JwtError::Expired`] when past the embedded expiry and
    /// [`JwtError::Invalid`] for every structural or signature failure, so
    /// callers cannot distinguish which check failed.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(AuthConfig::default())
    }

    #[test]
    fn round_trip_access_token() {
        let codec = codec();
        let token = codec
            .issue(42, "alice", Some("viewer"), TokenKind::Access)
            .unwrap();
        let claims = codec.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role.as_deref(), Some("viewer"));
    }

    #[test]
    fn refresh_token_omits_role() {
        let codec = codec();
        let token = codec.issue(42, "alice", None, TokenKind::Refresh).unwrap();
        let claims = codec.verify(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.role, None);
    }

    #[test]
    fn access_token_never_verifies_as_refresh() {
        let codec = codec();
        let token = codec
            .issue(42, "alice", Some("viewer"), TokenKind::Access)
            .unwrap();

        let result = codec.verify(&token, TokenKind::Refresh);
        assert!(matches!(result, Err(JwtError::Invalid)));
    }

    #[test]
    fn refresh_token_never_verifies_as_access() {
        let codec = codec();
        let token = codec.issue(42, "alice", None, TokenKind::Refresh).unwrap();

        let result = codec.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::Invalid)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            username: "alice".to_string(),
            role: Some("viewer".to_string()),
            iat: now - 7200,
            exp: now - 3600, // past the default decode leeway
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(AuthConfig::default().access_secret.as_bytes()),
        )
        .unwrap();

        let result = codec.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn tokens_issued_back_to_back_differ() {
        let codec = codec();
        let first = codec.issue(1, "alice", None, TokenKind::Refresh).unwrap();
        let second = codec.issue(1, "alice", None, TokenKind::Refresh).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_is_invalid() {
        let codec = codec();
        let result = codec.verify("not.a.token", TokenKind::Access);
        assert!(matches!(result, Err(JwtError::Invalid)));
    }
}
