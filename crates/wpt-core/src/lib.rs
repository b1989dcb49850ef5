//! Core domain types shared across the warehouse productivity tracker:
//! - User roles and the self-registration policy
//! - Configuration management

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, ServerConfig};

use serde::{Deserialize, Serialize};

/// User role enum
///
/// Defines the access level for a user in the system:
/// - Admin: full access including user management and deleting others' logs
/// - Editor: can view, create, update, and delete data
/// - Operator: warehouse floor worker, records their own daily logs
/// - Viewer: read-only access
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    Operator,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::Operator => "operator",
            UserRole::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "editor" => Some(UserRole::Editor),
            "operator" => Some(UserRole::Operator),
            "viewer" => Some(UserRole::Viewer),
            _ => None,
        }
    }

    /// Roles a user may pick for themselves at registration time.
    /// Operator and admin accounts are provisioned by an administrator.
    pub fn is_self_registrable(&self) -> bool {
        matches!(self, UserRole::Viewer | UserRole::Editor)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
