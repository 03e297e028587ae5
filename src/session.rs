//! Last-known authentication session, cached on the device

use log::debug;
use serde::{Deserialize, Serialize};

use crate::storage::{StorageKey, StorageService};
use fitness_tracker_auth::Session;

/// Session data as written to the device store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The user ID
    pub user_id: String,

    /// The expiry timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            user_id: session.user_id().to_string(),
            expires_at: session.expires_at,
        }
    }
}

/// Reads and writes the cached session under its own key.
#[derive(Clone)]
pub struct SessionCache {
    storage: StorageService,
    persist: bool,
}

impl SessionCache {
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            persist: true,
        }
    }

    /// With persistence off nothing is written and `load` sees whatever an
    /// earlier run left behind.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub async fn load(&self) -> Option<StoredSession> {
        self.storage.get(StorageKey::Session).await
    }

    pub async fn save(&self, session: &StoredSession) {
        if !self.persist {
            debug!("Session persistence disabled, not caching session");
            return;
        }
        self.storage.set(StorageKey::Session, session).await;
    }

    pub async fn clear(&self) {
        self.storage.remove(StorageKey::Session).await;
    }
}
