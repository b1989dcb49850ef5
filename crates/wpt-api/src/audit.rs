//! Security audit logging
//!
//! Structured records for authentication events, logged at INFO level with
//! the "audit" target so they can be filtered and routed separately from
//! application logs.

use serde::Serialize;
use tracing::info;

/// Authentication and authorization audit events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        user_id: i64,
        username: String,
    },
    LoginFailure {
        /// The identifier as presented; may be a username or an email
        identifier: String,
        reason: String,
    },
    RegistrationSuccess {
        user_id: i64,
        username: String,
        role: String,
    },
    RegistrationFailure {
        username: String,
        reason: String,
    },
    TokenRefresh {
        user_id: i64,
        username: String,
    },
    Logout {
        user_id: i64,
        username: String,
    },
    InvalidToken {
        reason: String,
    },
    AccessDenied {
        user_id: i64,
        username: String,
        required_roles: String,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::TokenRefresh { .. } => "Token refreshed",
            AuditEvent::Logout { .. } => "User logout",
            AuditEvent::InvalidToken { .. } => "Invalid token presented",
            AuditEvent::AccessDenied { .. } => "Access denied",
        }
    }
}

/// Log an audit event as structured JSON under the "audit" target
pub fn audit_log(event: &AuditEvent) {
    let payload = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"failed to serialize audit event: {e}\"}}"));

    info!(target: "audit", event = %payload, "{}", event.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = AuditEvent::LoginSuccess {
            user_id: 1,
            username: "alice".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_success\""));
        assert!(json.contains("alice"));
    }

    #[test]
    fn audit_log_does_not_panic() {
        audit_log(&AuditEvent::AccessDenied {
            user_id: 7,
            username: "bob".to_string(),
            required_roles: "admin".to_string(),
        });
    }
}
