//! On-device key-value persistence
//!
//! [`KeyValueStore`] is the raw asynchronous string store; [`StorageService`]
//! layers typed accessors for each persisted record on top of it. Reads never
//! fail: a missing, unreadable or malformed value turns into the record's
//! default (see [`decode`]) and the cause is logged.

mod file;
mod memory;

use async_trait::async_trait;
use log::error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::types::{Theme, User, Workout};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Asynchronous string store backing all persisted app data
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;

    async fn remove_item(&self, key: &str) -> Result<(), Error>;
}

/// Keys of the persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    HasSeenWelcome,
    Theme,
    UserData,
    Workouts,
    Session,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasSeenWelcome => "@hasSeenWelcome",
            Self::Theme => "@theme",
            Self::UserData => "@userData",
            Self::Workouts => "@workouts",
            Self::Session => "@supabase_session",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-key decoding of stored text, including the fallback used when the
/// value is absent or does not parse.
pub mod decode {
    use super::*;

    /// Only the literal `true` counts as seen.
    pub fn has_seen_welcome(raw: Option<&str>) -> bool {
        raw == Some("true")
    }

    pub fn theme(raw: Option<&str>) -> Theme {
        match raw.map(str::parse::<Theme>) {
            Some(Ok(theme)) => theme,
            Some(Err(err)) => {
                error!("Error getting theme: {}", err);
                Theme::default()
            }
            None => Theme::default(),
        }
    }

    pub fn user_data(raw: Option<&str>) -> Option<User> {
        json(StorageKey::UserData, raw)
    }

    pub fn workouts(raw: Option<&str>) -> Vec<Workout> {
        json(StorageKey::Workouts, raw).unwrap_or_default()
    }

    pub fn json<T: DeserializeOwned>(key: StorageKey, raw: Option<&str>) -> Option<T> {
        let raw = raw?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!("Error decoding {}: {}", key, err);
                None
            }
        }
    }
}

/// Typed access to the persisted records
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_raw(&self, key: StorageKey) -> Option<String> {
        match self.store.get_item(key.as_str()).await {
            Ok(value) => value,
            Err(err) => {
                error!("Error getting {}: {}", key, err);
                None
            }
        }
    }

    async fn write_raw(&self, key: StorageKey, value: &str) {
        if let Err(err) = self.store.set_item(key.as_str(), value).await {
            error!("Error setting {}: {}", key, err);
        }
    }

    /// Reads a JSON-encoded record; `None` when absent or unreadable.
    pub async fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = self.read_raw(key).await;
        decode::json(key, raw.as_deref())
    }

    /// Writes a JSON-encoded record. Failures are logged and dropped.
    pub async fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => self.write_raw(key, &text).await,
            Err(err) => error!("Error encoding {}: {}", key, err),
        }
    }

    pub async fn remove(&self, key: StorageKey) {
        if let Err(err) = self.store.remove_item(key.as_str()).await {
            error!("Error removing {}: {}", key, err);
        }
    }

    pub async fn get_has_seen_welcome(&self) -> bool {
        let raw = self.read_raw(StorageKey::HasSeenWelcome).await;
        decode::has_seen_welcome(raw.as_deref())
    }

    pub async fn set_has_seen_welcome(&self, value: bool) {
        self.write_raw(StorageKey::HasSeenWelcome, &value.to_string())
            .await;
    }

    pub async fn get_theme(&self) -> Theme {
        let raw = self.read_raw(StorageKey::Theme).await;
        decode::theme(raw.as_deref())
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.write_raw(StorageKey::Theme, theme.as_str()).await;
    }

    pub async fn get_user_data(&self) -> Option<User> {
        let raw = self.read_raw(StorageKey::UserData).await;
        decode::user_data(raw.as_deref())
    }

    pub async fn set_user_data(&self, user: &User) {
        self.set(StorageKey::UserData, user).await;
    }

    pub async fn clear_user_data(&self) {
        self.remove(StorageKey::UserData).await;
    }

    pub async fn get_workouts(&self) -> Vec<Workout> {
        let raw = self.read_raw(StorageKey::Workouts).await;
        decode::workouts(raw.as_deref())
    }

    pub async fn set_workouts(&self, workouts: &[Workout]) {
        self.set(StorageKey::Workouts, workouts).await;
    }
}
