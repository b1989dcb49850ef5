//! Application state shared across handlers

use crate::auth::jwt::TokenCodec;
use crate::auth::revocation::InMemoryRevocationList;
use crate::auth::service::AuthService;
use crate::auth::store::PgCredentialStore;
use sqlx::PgPool;
use std::sync::Arc;
use wpt_core::AppConfig;

/// Shared state: configuration, the auth service, and the database pool
/// used by the data-access modules.
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthService,
    pub pool: PgPool,
}

impl AppState {
    /// Wire up the production state: PostgreSQL credential store and the
    /// in-process revocation list.
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let auth = AuthService::new(
            Arc::new(PgCredentialStore::new(pool.clone())),
            Arc::new(InMemoryRevocationList::new()),
            TokenCodec::new(config.auth.clone()),
        );
        Self { config, auth, pool }
    }

    /// State with a caller-supplied auth service and a lazy pool that never
    /// connects, for driving the router in tests without a database.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing(config: AppConfig, auth: AuthService) -> Self {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:5432/wpt_test")
            .expect("lazy test pool");
        Self { config, auth, pool }
    }
}
