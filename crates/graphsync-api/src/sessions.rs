//! Device-auth session store.
//!
//! Tracks interactive authorization attempts keyed by their user-facing
//! device code. A session binds the asset being booked to the delegated
//! Graph client whose token the background poll completes; it is usable for
//! booking operations until evicted.
//!
//! Eviction is a best-effort sweep triggered after each successful
//! authorization rather than a timer, so a long-idle stale session persists
//! until the next authorization anywhere.

use chrono::{DateTime, Duration, Utc};
use graphsync_db::AssetMapping;
use graphsync_msgraph::GraphClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Sessions older than this are removed by the sweep.
pub const SESSION_RETENTION_DAYS: i64 = 7;

/// One authorized (or authorizing) booking session.
#[derive(Clone)]
pub struct AuthorizedSession {
    /// The asset the authorization was requested for.
    pub asset: AssetMapping,
    /// Delegated Graph client carrying the user's token.
    pub graph: Arc<GraphClient>,
    pub created_at: DateTime<Utc>,
}

/// Owned, lock-guarded session map.
///
/// The lock is held only for map access, never across a remote call.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, AuthorizedSession>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session under its device code.
    pub fn insert(&self, device_code: String, session: AuthorizedSession) {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .insert(device_code, session);
    }

    /// Session for the device code, if one is known.
    #[must_use]
    pub fn get(&self, device_code: &str) -> Option<AuthorizedSession> {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .get(device_code)
            .cloned()
    }

    /// Removes sessions past the retention window. Returns how many were
    /// evicted.
    pub fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now() - Duration::days(SESSION_RETENTION_DAYS);
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, session| session.created_at > cutoff);
        before - sessions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_msgraph::{Credentials, GraphEnvironment};

    fn mapping(asset_id: i32, email: &str) -> AssetMapping {
        AssetMapping {
            id: i64::from(asset_id),
            configuration_id: 1,
            project_id: "proj-1".to_string(),
            identifier: format!("microsoft_365_room_{email}"),
            asset_id,
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    fn session(asset_id: i32, email: &str, created_at: DateTime<Utc>) -> AuthorizedSession {
        let credentials = Credentials::DeviceCode {
            client_id: "client".to_string(),
            tenant_id: "tenant".to_string(),
        };
        let graph = GraphClient::new(
            credentials,
            GraphEnvironment::default(),
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        AuthorizedSession {
            asset: mapping(asset_id, email),
            graph: Arc::new(graph),
            created_at,
        }
    }

    #[test]
    fn sessions_are_retrievable_by_code() {
        let store = SessionStore::new();
        store.insert("CODE-1".to_string(), session(7, "hq101@contoso.com", Utc::now()));

        let found = store.get("CODE-1").unwrap();
        assert_eq!(found.asset.asset_id, 7);
        assert!(store.get("CODE-2").is_none());
    }

    #[test]
    fn concurrent_codes_never_cross_assign() {
        let store = SessionStore::new();
        store.insert("CODE-A".to_string(), session(1, "a@contoso.com", Utc::now()));
        store.insert("CODE-B".to_string(), session(2, "b@contoso.com", Utc::now()));

        assert_eq!(store.get("CODE-A").unwrap().asset.asset_id, 1);
        assert_eq!(store.get("CODE-B").unwrap().asset.asset_id, 2);
    }

    #[test]
    fn sweep_evicts_only_sessions_past_retention() {
        let store = SessionStore::new();
        let stale = Utc::now() - Duration::days(SESSION_RETENTION_DAYS) - Duration::hours(1);
        let fresh = Utc::now() - Duration::days(SESSION_RETENTION_DAYS) + Duration::hours(1);
        store.insert("OLD".to_string(), session(1, "a@contoso.com", stale));
        store.insert("NEW".to_string(), session(2, "b@contoso.com", fresh));

        let evicted = store.sweep_expired();

        assert_eq!(evicted, 1);
        assert!(store.get("OLD").is_none());
        assert!(store.get("NEW").is_some());
    }

    #[test]
    fn stale_session_remains_usable_until_swept() {
        let store = SessionStore::new();
        let stale = Utc::now() - Duration::days(SESSION_RETENTION_DAYS * 2);
        store.insert("OLD".to_string(), session(1, "a@contoso.com", stale));

        // No sweep has run yet; the session is still there.
        assert!(store.get("OLD").is_some());
    }
}
