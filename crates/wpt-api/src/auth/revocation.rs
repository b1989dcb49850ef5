//! Revocation registry
//!
//! Tracks token strings that must no longer be accepted even when they are
//! cryptographically valid and unexpired. Entries are added on logout and on
//! every successful refresh and never removed; growth is bounded only by
//! natural token expiry.

use std::collections::HashSet;
use std::sync::Mutex;

/// Membership store for revoked tokens
///
/// Encapsulated behind a trait so the in-process set can be swapped for a
/// shared store (Redis, database) in multi-instance deployments without
/// changing the session manager's contract.
pub trait RevocationStore: Send + Sync {
    /// Idempotently mark a token as no longer acceptable
    fn revoke(&self, token: &str);

    /// Pure membership lookup
    fn is_revoked(&self, token: &str) -> bool;
}

/// In-memory revocation list for single-instance deployments
///
/// Does not survive a process restart: a revoked-but-unexpired token becomes
/// acceptable again after a restart. This is a documented limitation of the
/// in-process backing, not something this type tries to paper over.
#[derive(Debug, Default)]
pub struct InMemoryRevocationList {
    revoked: Mutex<HashSet<String>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for InMemoryRevocationList {
    fn revoke(&self, token: &str) {
        let mut revoked = self.revoked.lock().unwrap();
        revoked.insert(token.to_string());
    }

    fn is_revoked(&self, token: &str) -> bool {
        let revoked = self.revoked.lock().unwrap();
        revoked.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_and_lookup() {
        let list = InMemoryRevocationList::new();

        assert!(!list.is_revoked("token-a"));
        list.revoke("token-a");
        assert!(list.is_revoked("token-a"));
        assert!(!list.is_revoked("token-b"));
    }

    #[test]
    fn revoke_is_idempotent() {
        let list = InMemoryRevocationList::new();

        list.revoke("token-a");
        list.revoke("token-a");
        assert!(list.is_revoked("token-a"));
    }
}
