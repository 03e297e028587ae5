//! Top-level screen selection: welcome, then sign-in, then the main tabs

use crate::observable::Observable;
use crate::reconciler::AuthState;
use crate::storage::StorageService;

/// Pages inside the auth stack. Startup always lands on `Login`; the
/// screens switch to `Register` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRoute {
    Login,
    Register,
}

/// Tabs of the main screen. `Workouts` is the initial tab; the tab bar
/// selects `Profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTab {
    Workouts,
    Profile,
}

/// The screen the app should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Startup checks still running; nothing is rendered
    Loading,
    Welcome,
    Auth(AuthRoute),
    Main(MainTab),
}

/// `has_seen_welcome` is `None` until the flag has been read.
pub fn resolve_screen(has_seen_welcome: Option<bool>, auth: &AuthState) -> Screen {
    match (has_seen_welcome, auth) {
        (None, _) | (_, AuthState::Loading) => Screen::Loading,
        (Some(false), _) => Screen::Welcome,
        (Some(true), AuthState::Unauthenticated) => Screen::Auth(AuthRoute::Login),
        (Some(true), AuthState::Authenticated(_)) => Screen::Main(MainTab::Workouts),
    }
}

/// Tracks the welcome flag for screen selection.
pub struct ScreenFlow {
    storage: StorageService,
    has_seen_welcome: Observable<Option<bool>>,
}

impl ScreenFlow {
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            has_seen_welcome: Observable::new(None),
        }
    }

    pub async fn load(&self) -> bool {
        let seen = self.storage.get_has_seen_welcome().await;
        self.has_seen_welcome.set(Some(seen));
        seen
    }

    pub fn has_seen_welcome(&self) -> Option<bool> {
        self.has_seen_welcome.get()
    }

    /// Called when the user leaves the welcome screen.
    pub async fn complete_welcome(&self) {
        self.storage.set_has_seen_welcome(true).await;
        self.has_seen_welcome.set(Some(true));
    }

    pub fn current(&self, auth: &AuthState) -> Screen {
        resolve_screen(self.has_seen_welcome(), auth)
    }
}
