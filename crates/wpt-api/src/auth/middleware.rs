//! Request gate: authentication and authorization middleware
//!
//! Extracts the bearer token from the Authorization header, validates it
//! through the token codec and revocation registry, and attaches the
//! resulting identity to the request extensions. A separate role middleware
//! compares that identity against a per-route allow-list.

use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::jwt::{JwtError, TokenKind};

/// Identity extracted from a validated access token
///
/// Added to request extensions by [`auth_middleware`]; handlers extract it
/// with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Require a valid, unrevoked access token
///
/// The role claim must be present: an otherwise-valid token without one is
/// rejected as a malformed access token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("No authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header format".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = state
        .auth
        .codec()
        .verify(token, TokenKind::Access)
        .map_err(|e| {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
            });
            match e {
                JwtError::Expired => {
                    AppError::Unauthorized("Access token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid access token".to_string()),
            }
        })?;

    // A structurally valid, unexpired token can still have been revoked.
    if state.auth.revocations().is_revoked(token) {
        audit_log(&AuditEvent::InvalidToken {
            reason: "token revoked".to_string(),
        });
        return Err(AppError::Unauthorized("Token has been revoked".to_string()));
    }

    let role = claims
        .role
        .ok_or_else(|| AppError::Unauthorized("Invalid token payload".to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser {
        id: claims.sub,
        username: claims.username,
        role,
    });

    Ok(next.run(request).await)
}

type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// Middleware factory for role-based access control
///
/// Returns 403 when the authenticated user's role is not in the allow-list.
/// Must be layered inside [`auth_middleware`].
pub fn require_any_role(
    allowed_roles: &'static [&'static str],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

            if !allowed_roles.contains(&user.role.as_str()) {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: user.id,
                    username: user.username.clone(),
                    required_roles: allowed_roles.join(","),
                });
                return Err(AppError::Forbidden("Insufficient permissions".to_string()));
            }

            Ok(next.run(request).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenCodec;
    use crate::auth::revocation::{InMemoryRevocationList, RevocationStore};
    use crate::auth::service::AuthService;
    use crate::auth::store::memory::InMemoryStore;
    use axum::http::StatusCode;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;
    use wpt_core::config::AppConfig;

    fn test_state() -> Arc<AppState> {
        let config = AppConfig::default();
        let auth = AuthService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryRevocationList::new()),
            TokenCodec::new(config.auth.clone()),
        );
        Arc::new(AppState::for_testing(config, auth))
    }

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        user.username
    }

    fn protected_app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route(
                "/admin-only",
                get(|| async { "ok" })
                    .route_layer(middleware::from_fn(require_any_role(&["admin"]))),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let app = protected_app(test_state());
        let response = app.oneshot(get_request("/whoami", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let app = protected_app(test_state());
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Basic abc123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let state = test_state();
        let token = state
            .auth
            .codec()
            .issue(1, "alice", Some("viewer"), TokenKind::Access)
            .unwrap();

        let app = protected_app(state);
        let response = app
            .oneshot(get_request("/whoami", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alice");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let state = test_state();
        let token = state
            .auth
            .codec()
            .issue(1, "alice", Some("viewer"), TokenKind::Access)
            .unwrap();
        state.auth.revocations().revoke(&token);

        let app = protected_app(state);
        let response = app
            .oneshot(get_request("/whoami", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_without_role_is_rejected() {
        let state = test_state();
        // Signed with the access secret but missing the role claim.
        let token = state
            .auth
            .codec()
            .issue(1, "alice", None, TokenKind::Access)
            .unwrap();

        let app = protected_app(state);
        let response = app
            .oneshot(get_request("/whoami", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let state = test_state();
        let token = state
            .auth
            .codec()
            .issue(1, "alice", None, TokenKind::Refresh)
            .unwrap();

        let app = protected_app(state);
        let response = app
            .oneshot(get_request("/whoami", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn role_allow_list_is_enforced() {
        let state = test_state();
        let viewer = state
            .auth
            .codec()
            .issue(1, "alice", Some("viewer"), TokenKind::Access)
            .unwrap();
        let admin = state
            .auth
            .codec()
            .issue(2, "root", Some("admin"), TokenKind::Access)
            .unwrap();

        let app = protected_app(state);
        let denied = app
            .clone()
            .oneshot(get_request("/admin-only", Some(&viewer)))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let allowed = app
            .oneshot(get_request("/admin-only", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }
}
