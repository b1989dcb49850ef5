//! Credential store
//!
//! Persistence seam for user records. The session manager only depends on
//! the [`CredentialStore`] trait, so the PostgreSQL implementation can be
//! substituted with the in-memory store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use wpt_core::UserRole;

/// Persisted user record
///
/// Mutated only through registration (create) and refresh/logout
/// (`refresh_token` updates); never deleted by the auth subsystem.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    /// The single currently-stored refresh token, if any
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
}

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown role stored for user: {0}")]
    UnknownRole(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Lookup and mutation operations the session manager needs
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user whose username or email equals `identifier`
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Exact-column lookup, for duplicate checks where the either-column
    /// match of [`Self::find_by_username_or_email`] could return the wrong row
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Overwrite the stored refresh token; `None` clears it
    async fn update_refresh_token(
        &self,
        user_id: i64,
        token: Option<&str>,
    ) -> Result<(), StoreError>;

    /// All users, for the user listing endpoint
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> Result<UserRecord, StoreError> {
        let role = UserRole::parse(&self.role).ok_or(StoreError::UnknownRole(self.role))?;
        Ok(UserRecord {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            role,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
        })
    }
}

const USER_SELECT: &str = "SELECT u.id, u.username, u.email, u.password_hash, u.full_name, \
     r.name AS role, u.refresh_token, u.created_at \
     FROM users u JOIN roles r ON r.id = u.role_id";

/// PostgreSQL-backed credential store
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{USER_SELECT} WHERE u.username = $1 OR u.email = $1 LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_record).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_record).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_record).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_record).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, full_name, role_id) \
             VALUES ($1, $2, $3, $4, (SELECT id FROM roles WHERE name = $5)) \
             RETURNING id, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(UserRecord {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            refresh_token: None,
            created_at,
        })
    }

    async fn update_refresh_token(
        &self,
        user_id: i64,
        token: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET refresh_token = $1, updated_at = NOW() WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY u.id"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_record).collect()
    }
}

/// In-memory credential store for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// Vec-backed store with the same contract as [`PgCredentialStore`]
    #[derive(Debug, Default)]
    pub struct InMemoryStore {
        users: Mutex<Vec<UserRecord>>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl CredentialStore for InMemoryStore {
        async fn find_by_username_or_email(
            &self,
            identifier: &str,
        ) -> Result<Option<UserRecord>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .iter()
                .find(|u| u.username == identifier || u.email == identifier)
                .cloned())
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserRecord>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.username == username).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == id).cloned())
        }

        async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
            let mut users = self.users.lock().unwrap();
            let record = UserRecord {
                id: users.len() as i64 + 1,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                full_name: user.full_name,
                role: user.role,
                refresh_token: None,
                created_at: Utc::now(),
            };
            users.push(record.clone());
            Ok(record)
        }

        async fn update_refresh_token(
            &self,
            user_id: i64,
            token: Option<&str>,
        ) -> Result<(), StoreError> {
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
                user.refresh_token = token.map(|t| t.to_string());
            }
            Ok(())
        }

        async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
            Ok(self.users.lock().unwrap().clone())
        }
    }
}
