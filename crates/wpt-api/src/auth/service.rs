//! Session manager
//!
//! Business logic for registration, login, token refresh, and logout.
//! Orchestrates the token codec, revocation registry, and credential store,
//! and enforces the rotation policy: one active refresh token per user, the
//! old one revoked in the same operation that issues its replacement.

use super::jwt::{JwtError, TokenCodec, TokenKind};
use super::password::{hash_password, verify_password};
use super::revocation::RevocationStore;
use super::store::{CredentialStore, NewUser, StoreError, UserRecord};
use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;
use wpt_core::UserRole;

/// User registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "must be 2-100 characters"))]
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "roleId")]
    pub role_id: i64,
}

/// User login request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(rename = "usernameOrEmail")]
    pub username_or_email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Public view of a user, never carrying the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: String,
}

impl From<&UserRecord> for UserPublic {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.to_string(),
        }
    }
}

/// Login response: the public user plus both tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserPublic,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Refresh response: a freshly rotated token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Role ids as seeded by the initial migration
fn role_from_id(role_id: i64) -> Option<UserRole> {
    match role_id {
        1 => Some(UserRole::Viewer),
        2 => Some(UserRole::Editor),
        3 => Some(UserRole::Operator),
        4 => Some(UserRole::Admin),
        _ => None,
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            store,
            revocations,
            codec,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn revocations(&self) -> &dyn RevocationStore {
        self.revocations.as_ref()
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Register a new user
    ///
    /// Only the self-registrable roles (viewer, editor) are accepted;
    /// operator and admin accounts are provisioned out of band.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserPublic, AppError> {
        // Exact-column lookups: the either-column login lookup could return
        // a row whose email happens to equal the requested username and
        // shadow the real duplicate.
        if self.store.find_by_username(&request.username).await?.is_some() {
            audit_log(&AuditEvent::RegistrationFailure {
                username: request.username.clone(),
                reason: "username taken".to_string(),
            });
            return Err(AppError::Conflict("Username already registered".to_string()));
        }
        if self.store.find_by_email(&request.email).await?.is_some() {
            audit_log(&AuditEvent::RegistrationFailure {
                username: request.username.clone(),
                reason: "email taken".to_string(),
            });
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let role = role_from_id(request.role_id)
            .filter(UserRole::is_self_registrable)
            .ok_or_else(|| {
                AppError::BadRequest(
                    "Invalid role. Only viewer and editor roles are allowed.".to_string(),
                )
            })?;

        let password_hash = hash_password(&request.password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

        let user = self
            .store
            .create(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                full_name: request.full_name,
                role,
            })
            .await?;

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
        });

        Ok(UserPublic::from(&user))
    }

    /// Login with a username or email
    ///
    /// Unknown identifier and wrong password collapse into one error so the
    /// response never reveals which field matched.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .find_by_username_or_email(&request.username_or_email)
            .await?
            .ok_or_else(|| {
                audit_log(&AuditEvent::LoginFailure {
                    identifier: request.username_or_email.clone(),
                    reason: "unknown identifier".to_string(),
                });
                invalid()
            })?;

        let password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))?;
        if !password_valid {
            audit_log(&AuditEvent::LoginFailure {
                identifier: request.username_or_email.clone(),
                reason: "password mismatch".to_string(),
            });
            return Err(invalid());
        }

        let access_token = self.codec.issue(
            user.id,
            &user.username,
            Some(user.role.as_str()),
            TokenKind::Access,
        )?;
        let refresh_token = self
            .codec
            .issue(user.id, &user.username, None, TokenKind::Refresh)?;

        // Overwrites any token from an earlier login; the stored-token check
        // in `refresh` is what retires the earlier one.
        self.store
            .update_refresh_token(user.id, Some(&refresh_token))
            .await?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            username: user.username.clone(),
        });

        Ok(AuthResponse {
            user: UserPublic::from(&user),
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access/refresh pair
    ///
    /// The consumed token is revoked in the same operation (rotation), so a
    /// captured refresh token cannot be replayed after its first use. The
    /// presented token must also equal the user's stored current token;
    /// every failure cause collapses into the same 401.
    pub async fn refresh(&self, token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .codec
            .verify(token, TokenKind::Refresh)
            .map_err(|e| match e {
                JwtError::Expired => {
                    AppError::Unauthorized("Refresh token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid refresh token".to_string()),
            })?;

        if self.revocations.is_revoked(token) {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked".to_string(),
            ));
        }

        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.refresh_token.as_deref() == Some(token))
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        self.revocations.revoke(token);

        let access_token = self.codec.issue(
            user.id,
            &user.username,
            Some(user.role.as_str()),
            TokenKind::Access,
        )?;
        let new_refresh_token = self
            .codec
            .issue(user.id, &user.username, None, TokenKind::Refresh)?;

        self.store
            .update_refresh_token(user.id, Some(&new_refresh_token))
            .await?;

        audit_log(&AuditEvent::TokenRefresh {
            user_id: user.id,
            username: user.username.clone(),
        });

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Revoke and clear the user's stored refresh token
    ///
    /// Idempotent: a second logout, or one with no stored token, succeeds
    /// with no effect.
    pub async fn logout(&self, user_id: i64) -> Result<(), AppError> {
        if let Some(user) = self.store.find_by_id(user_id).await? {
            if let Some(token) = &user.refresh_token {
                self.revocations.revoke(token);
                self.store.update_refresh_token(user_id, None).await?;
                audit_log(&AuditEvent::Logout {
                    user_id,
                    username: user.username.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::Unauthorized("Token has expired".to_string()),
            JwtError::Invalid => AppError::Unauthorized("Invalid token".to_string()),
            JwtError::Encoding(e) => AppError::Internal(format!("Failed to encode token: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::revocation::InMemoryRevocationList;
    use crate::auth::store::memory::InMemoryStore;
    use wpt_core::config::AuthConfig;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryRevocationList::new()),
            TokenCodec::new(AuthConfig::default()),
        )
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            full_name: "Test User".to_string(),
            role_id: 1, // viewer
        }
    }

    fn unauthorized_message(err: AppError) -> String {
        match err {
            AppError::Unauthorized(msg) => msg,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_then_login_preserves_role() {
        let svc = service();
        let user = svc
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, "viewer");

        let response = svc
            .login(LoginRequest {
                username_or_email: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.role, "viewer");
        assert_eq!(response.user.username, "alice");
    }

    #[tokio::test]
    async fn login_by_email_also_works() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let response = svc
            .login(LoginRequest {
                username_or_email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = svc
            .register(register_request("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = svc
            .register(register_request("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_username_detected_when_another_email_matches_it() {
        let svc = service();
        // bob's email equals the username a later user picks; that row must
        // not shadow the real username duplicate.
        svc.register(register_request("bob", "carol@example.com"))
            .await
            .unwrap();
        svc.register(register_request("carol@example.com", "carol@real.com"))
            .await
            .unwrap();

        let err = svc
            .register(register_request("carol@example.com", "third@example.com"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Username already registered"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_self_registrable_role_is_rejected() {
        let svc = service();
        let mut request = register_request("alice", "alice@example.com");
        request.role_id = 4; // admin

        let err = svc.register(request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let wrong_password = svc
            .login(LoginRequest {
                username_or_email: "alice".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = svc
            .login(LoginRequest {
                username_or_email: "nobody".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            unauthorized_message(wrong_password),
            unauthorized_message(unknown_user)
        );
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        let login = svc
            .login(LoginRequest {
                username_or_email: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let pair = svc.refresh(&login.refresh_token).await.unwrap();
        assert_ne!(pair.refresh_token, login.refresh_token);

        // The consumed token must not be accepted a second time.
        let err = svc.refresh(&login.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        // The rotated token keeps working.
        assert!(svc.refresh(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        let login = svc
            .login(LoginRequest {
                username_or_email: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let err = svc.refresh(&login.access_token).await.unwrap_err();
        assert_eq!(unauthorized_message(err), "Invalid refresh token");
    }

    #[tokio::test]
    async fn second_login_retires_the_first_refresh_token() {
        let svc = service();
        svc.register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        let login = LoginRequest {
            username_or_email: "alice".to_string(),
            password: "password123".to_string(),
        };

        let first = svc.login(login.clone()).await.unwrap();
        let second = svc.login(login).await.unwrap();

        // Only the stored (latest) token is accepted.
        assert!(svc.refresh(&first.refresh_token).await.is_err());
        assert!(svc.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn logout_revokes_and_is_idempotent() {
        let svc = service();
        let user = svc
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        let login = svc
            .login(LoginRequest {
                username_or_email: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        svc.logout(user.id).await.unwrap();

        let err = svc.refresh(&login.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        // Second logout is a no-op that still succeeds.
        svc.logout(user.id).await.unwrap();
    }

    #[tokio::test]
    async fn logout_for_unknown_user_is_a_no_op() {
        let svc = service();
        assert!(svc.logout(999).await.is_ok());
    }
}
