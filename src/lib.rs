//! Fitness Tracker app core
//!
//! The state and operations behind a fitness tracking client: welcome flag,
//! email/password authentication against a hosted auth service, a workout
//! catalog, the user profile and a light/dark theme. Screens render what
//! [`FitnessApp`] exposes and call its operations; persistence goes through a
//! [`KeyValueStore`](storage::KeyValueStore) on the device.

pub mod catalog;
pub mod config;
pub mod error;
pub mod flow;
pub mod observable;
pub mod provider;
pub mod reconciler;
pub mod session;
pub mod storage;
pub mod theme;
pub mod types;
pub mod validation;

use log::info;
use std::sync::Arc;
use url::Url;

use crate::catalog::WorkoutCatalog;
use crate::config::AppOptions;
use crate::error::Error;
use crate::flow::{Screen, ScreenFlow};
use crate::provider::AuthProvider;
use crate::reconciler::AuthReconciler;
use crate::session::SessionCache;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageService};
use crate::theme::ThemeToggle;
use fitness_tracker_auth::AuthClient;

/// The main entry point: every service the screens talk to
pub struct FitnessApp {
    /// Options the app was built with
    pub options: AppOptions,
    storage: StorageService,
    auth: AuthReconciler,
    theme: ThemeToggle,
    catalog: WorkoutCatalog,
    flow: ScreenFlow,
}

impl FitnessApp {
    /// Create the app against a hosted auth service
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fitness_tracker::{FitnessApp, config::AppOptions};
    ///
    /// # async fn run() -> Result<(), fitness_tracker::error::Error> {
    /// let options = AppOptions::new("https://your-project-url.supabase.co", "your-anon-key")
    ///     .with_storage_path("fitness-tracker.json");
    /// let app = FitnessApp::new(options)?;
    /// let screen = app.start().await;
    /// println!("showing {:?}", screen);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(options: AppOptions) -> Result<Self, Error> {
        Url::parse(&options.supabase_url)?;

        let client = AuthClient::with_options(
            &options.supabase_url,
            &options.supabase_key,
            options.auth_options(),
        )?;

        let store: Arc<dyn KeyValueStore> = match options.storage_path {
            Some(ref path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::from_parts(store, Arc::new(client), options))
    }

    /// Create the app from an existing store and provider
    pub fn from_parts(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn AuthProvider>,
        options: AppOptions,
    ) -> Self {
        let storage = StorageService::new(store);
        let sessions = SessionCache::new(storage.clone()).with_persist(options.persist_session);

        Self {
            auth: AuthReconciler::new(provider, storage.clone(), sessions),
            theme: ThemeToggle::new(storage.clone()),
            catalog: WorkoutCatalog::new(storage.clone()),
            flow: ScreenFlow::new(storage.clone()),
            storage,
            options,
        }
    }

    /// Loads the theme and welcome flag, starts the auth listener and runs
    /// the startup auth check. Returns the first screen to show.
    pub async fn start(&self) -> Screen {
        self.theme.load().await;
        self.flow.load().await;

        if self.options.auto_start_listener {
            self.auth.start_listening();
        }
        self.auth.initialize().await;

        let screen = self.screen();
        info!("App started on {:?}", screen);
        screen
    }

    /// The screen to show for the current state
    pub fn screen(&self) -> Screen {
        self.flow.current(&self.auth.state())
    }

    /// Leave the welcome screen for good
    pub async fn complete_welcome(&self) -> Screen {
        self.flow.complete_welcome().await;
        self.screen()
    }

    pub fn auth(&self) -> &AuthReconciler {
        &self.auth
    }

    pub fn theme(&self) -> &ThemeToggle {
        &self.theme
    }

    pub fn catalog(&self) -> &WorkoutCatalog {
        &self.catalog
    }

    pub fn flow(&self) -> &ScreenFlow {
        &self.flow
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    /// Detach the auth listener
    pub fn shutdown(&self) {
        self.auth.shutdown();
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::AppOptions;
    pub use crate::error::Error;
    pub use crate::flow::{AuthRoute, MainTab, Screen};
    pub use crate::reconciler::AuthState;
    pub use crate::types::{Category, Difficulty, Theme, User, Workout};
    pub use crate::FitnessApp;
}
