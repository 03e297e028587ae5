//! Configuration options for the fitness tracker app core

use std::path::PathBuf;
use std::time::Duration;

use fitness_tracker_auth::AuthOptions;

/// Configuration options for [`FitnessApp`](crate::FitnessApp)
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Base URL of the authentication backend (Supabase project URL)
    pub supabase_url: String,

    /// Anonymous API key for the backend
    pub supabase_key: String,

    /// File backing the on-device store; `None` keeps everything in memory
    pub storage_path: Option<PathBuf>,

    /// The request timeout for provider calls
    pub request_timeout: Option<Duration>,

    /// Whether the session is written to the on-device store
    pub persist_session: bool,

    /// Whether `start` subscribes to provider auth-state changes
    pub auto_start_listener: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_key: String::new(),
            storage_path: None,
            request_timeout: Some(Duration::from_secs(30)),
            persist_session: true,
            auto_start_listener: true,
        }
    }
}

impl AppOptions {
    /// Options pointing at a backend project
    pub fn new(supabase_url: &str, supabase_key: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            supabase_key: supabase_key.to_string(),
            ..Self::default()
        }
    }

    /// Set the file backing the on-device store
    pub fn with_storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set whether to listen for provider auth-state changes on start
    pub fn with_auto_start_listener(mut self, value: bool) -> Self {
        self.auto_start_listener = value;
        self
    }

    pub(crate) fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            request_timeout: self.request_timeout,
            ..AuthOptions::default()
        }
    }
}
