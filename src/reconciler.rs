//! Authentication state for the app
//!
//! [`AuthReconciler`] decides whether someone is signed in by combining the
//! session cached on the device, the provider's view of the session and the
//! locally stored profile. It owns the observable [`AuthState`] that screens
//! read; nothing else writes it.
//!
//! Direct calls (`sign_in`, `sign_out`, ...) and provider push notifications
//! take the same mutation lock, so they are applied one at a time in the order
//! they acquire it.

use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::observable::{Observable, Subscription};
use crate::provider::AuthProvider;
use crate::session::{SessionCache, StoredSession};
use crate::storage::StorageService;
use crate::types::User;
use fitness_tracker_auth::{self as auth, AuthChangeEvent, Session};

/// Observable authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Loading,
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

fn event_name(event: &AuthChangeEvent) -> &'static str {
    match event {
        AuthChangeEvent::SignedIn(_) => "SIGNED_IN",
        AuthChangeEvent::SignedOut => "SIGNED_OUT",
        AuthChangeEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
        AuthChangeEvent::UserUpdated(_) => "USER_UPDATED",
    }
}

struct Inner {
    provider: Arc<dyn AuthProvider>,
    storage: StorageService,
    sessions: SessionCache,
    state: Observable<AuthState>,
    mutation: tokio::sync::Mutex<()>,
}

impl Inner {
    fn transition(&self, next: AuthState) {
        if self.state.get() == next {
            return;
        }
        match &next {
            AuthState::Authenticated(user) => info!("Auth state: authenticated as {}", user.id),
            AuthState::Unauthenticated => info!("Auth state: unauthenticated"),
            AuthState::Loading => info!("Auth state: loading"),
        }
        self.state.set(next);
    }

    /// The stored profile when it belongs to `user`, otherwise a fresh
    /// placeholder profile which replaces it on disk.
    async fn load_profile(&self, user: &auth::User) -> User {
        match self.storage.get_user_data().await {
            Some(profile) if profile.id == user.id => profile,
            stale => {
                if let Some(stale) = stale {
                    debug!("Stored profile belongs to {}, replacing it", stale.id);
                }
                let profile = User::placeholder(&user.id, user.email.as_deref());
                self.storage.set_user_data(&profile).await;
                profile
            }
        }
    }

    async fn adopt_session(&self, session: &Session) -> User {
        self.sessions.save(&StoredSession::from(session)).await;
        self.load_profile(&session.user).await
    }

    async fn restore(&self) -> Result<Option<User>, Error> {
        if let Some(cached) = self.sessions.load().await {
            debug!("Restoring cached session for {}", cached.user_id);
            let session = self
                .provider
                .set_session(&cached.access_token, &cached.refresh_token)
                .await?;
            return Ok(Some(self.adopt_session(&session).await));
        }

        match self.provider.get_session().await {
            Some(session) => {
                debug!("Adopting provider session for {}", session.user.id);
                Ok(Some(self.adopt_session(&session).await))
            }
            None => Ok(None),
        }
    }

    async fn handle_event(&self, event: AuthChangeEvent) {
        let _guard = self.mutation.lock().await;
        debug!("Auth state change: {}", event_name(&event));

        // Events are queued behind direct calls; only act on one that still
        // matches what the provider holds now.
        let current = self.provider.get_session().await;
        match (event.session(), current) {
            (Some(pushed), Some(current)) if pushed.access_token == current.access_token => {
                let user = self.adopt_session(&current).await;
                self.transition(AuthState::Authenticated(user));
            }
            (None, None) => {
                self.sessions.clear().await;
                self.transition(AuthState::Unauthenticated);
            }
            _ => debug!("Ignoring superseded {} event", event_name(&event)),
        }
    }

    /// Catches up with the provider after missed notifications.
    async fn resync(&self) {
        let _guard = self.mutation.lock().await;
        match self.provider.get_session().await {
            Some(session) => {
                let user = self.adopt_session(&session).await;
                self.transition(AuthState::Authenticated(user));
            }
            None => {
                self.sessions.clear().await;
                self.transition(AuthState::Unauthenticated);
            }
        }
    }
}

/// Signs users in and out and keeps the current-user state.
pub struct AuthReconciler {
    inner: Arc<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthReconciler {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        storage: StorageService,
        sessions: SessionCache,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                storage,
                sessions,
                state: Observable::new(AuthState::Loading),
                mutation: tokio::sync::Mutex::new(()),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Registers a listener for state changes; see [`Observable::subscribe`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.inner.state.subscribe(listener)
    }

    /// Startup check: restore the cached session, or adopt the provider's own,
    /// or settle on unauthenticated.
    ///
    /// A cached session the provider refuses to restore is dropped and the
    /// state becomes `Unauthenticated`; the app never stays in `Loading`.
    pub async fn initialize(&self) -> AuthState {
        let _guard = self.inner.mutation.lock().await;

        let next = match self.inner.restore().await {
            Ok(Some(user)) => AuthState::Authenticated(user),
            Ok(None) => AuthState::Unauthenticated,
            Err(err) => {
                error!("Error checking user: {}", err);
                self.inner.sessions.clear().await;
                AuthState::Unauthenticated
            }
        };

        self.inner.transition(next.clone());
        next
    }

    /// Signs in with email and password.
    ///
    /// A stored profile for the same user is reused, so names and phone
    /// entered before a sign-out come back. Provider rejections are returned
    /// and leave the state untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, Error> {
        let _guard = self.inner.mutation.lock().await;

        let session = self
            .inner
            .provider
            .sign_in_with_password(email, password)
            .await?;
        let user = self.inner.adopt_session(&session).await;

        self.inner.transition(AuthState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Creates an account. The new user always starts with an empty profile,
    /// even when the device holds one for the same id.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, Error> {
        let _guard = self.inner.mutation.lock().await;

        let response = self.inner.provider.sign_up(email, password).await?;
        if let Some(ref session) = response.session {
            self.inner.sessions.save(&StoredSession::from(session)).await;
        }

        let user = User::placeholder(&response.user.id, response.user.email.as_deref());
        self.inner.storage.set_user_data(&user).await;

        self.inner.transition(AuthState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Signs out. A failing provider call is only logged; the cached session
    /// is removed and the state becomes `Unauthenticated` regardless. The
    /// stored profile and workouts are kept.
    pub async fn sign_out(&self) {
        let _guard = self.inner.mutation.lock().await;

        if let Err(err) = self.inner.provider.sign_out().await {
            error!("Error signing out: {}", err);
        }
        self.inner.sessions.clear().await;

        self.inner.transition(AuthState::Unauthenticated);
    }

    /// Stores `profile` as given and publishes it. Field validation is the
    /// caller's job (see [`crate::validation::validate_profile`]).
    pub async fn update_user(&self, profile: User) {
        let _guard = self.inner.mutation.lock().await;

        self.inner.storage.set_user_data(&profile).await;
        self.inner.transition(AuthState::Authenticated(profile));
    }

    /// Starts applying provider push notifications. Must be called from
    /// within a tokio runtime; calling it again while listening is a no-op.
    pub fn start_listening(&self) {
        let mut slot = self.listener_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let mut events = self.inner.provider.on_auth_state_change();
        let inner = Arc::clone(&self.inner);

        *slot = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => inner.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} auth state changes, resyncing", skipped);
                        inner.resync().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Auth state change stream closed");
                        break;
                    }
                }
            }
        }));
        debug!("Listening for auth state changes");
    }

    pub fn is_listening(&self) -> bool {
        self.listener_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Detaches the push listener.
    pub fn shutdown(&self) {
        if let Some(handle) = self.listener_slot().take() {
            handle.abort();
            debug!("Stopped listening for auth state changes");
        }
    }

    fn listener_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for AuthReconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
