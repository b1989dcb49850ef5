//! Authentication and session-token subsystem
//!
//! - `jwt`: token codec (issue/verify per token kind)
//! - `password`: Argon2id hashing
//! - `revocation`: registry of tokens that must no longer be accepted
//! - `store`: credential store seam over PostgreSQL
//! - `service`: session manager (register, login, refresh, logout)
//! - `middleware`: request gate and role allow-list checks

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod service;
pub mod store;

pub use jwt::{Claims, JwtError, TokenCodec, TokenKind};
pub use middleware::{auth_middleware, require_any_role, AuthenticatedUser};
pub use revocation::{InMemoryRevocationList, RevocationStore};
pub use service::{
    AuthResponse, AuthService, LoginRequest, RefreshRequest, RegisterRequest, TokenPair,
    UserPublic,
};
pub use store::{CredentialStore, NewUser, PgCredentialStore, StoreError, UserRecord};
