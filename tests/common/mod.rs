#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use fitness_tracker::provider::AuthProvider;
use fitness_tracker::reconciler::{AuthReconciler, AuthState};
use fitness_tracker::session::SessionCache;
use fitness_tracker::storage::{MemoryStore, StorageService};
use fitness_tracker_auth::{AuthChangeEvent, AuthError, Session, SignUpResponse, User};

struct Account {
    password: String,
    user: User,
}

/// In-process stand-in for the hosted auth service.
pub struct FakeProvider {
    accounts: Mutex<HashMap<String, Account>>,
    issued: Mutex<HashMap<String, Session>>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthChangeEvent>,
    counter: AtomicU64,
    pub fail_sign_out: AtomicBool,
    pub fail_set_session: AtomicBool,
    pub confirm_email_on_sign_up: AtomicBool,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            issued: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            counter: AtomicU64::new(1),
            fail_sign_out: AtomicBool::new(false),
            fail_set_session: AtomicBool::new(false),
            confirm_email_on_sign_up: AtomicBool::new(false),
        })
    }

    /// Creates an account directly on the "server"; returns the user id.
    pub fn register(&self, email: &str, password: &str) -> String {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            phone: None,
            app_metadata: serde_json::json!({}),
            user_metadata: serde_json::json!({}),
            created_at: None,
            updated_at: None,
        };
        let id = user.id.clone();
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user,
            },
        );
        id
    }

    fn issue(&self, user: &User) -> Session {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let session = Session {
            access_token: format!("access-{}-{}", user.id, n),
            refresh_token: format!("refresh-{}-{}", user.id, n),
            expires_in: 3600,
            expires_at: None,
            token_type: "bearer".to_string(),
            user: user.clone(),
        };
        self.issued
            .lock()
            .unwrap()
            .insert(session.access_token.clone(), session.clone());
        session
    }

    fn user_by_email(&self, email: &str) -> Option<User> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|account| account.user.clone())
    }

    pub fn current(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    /// A session the provider holds on its own, without a notification.
    pub fn set_ambient_session(&self, email: &str) -> Session {
        let user = self.user_by_email(email).expect("registered account");
        let session = self.issue(&user);
        *self.current.lock().unwrap() = Some(session.clone());
        session
    }

    /// Server-side token refresh pushed to the client.
    pub fn push_token_refresh(&self, email: &str) -> Session {
        let session = self.set_ambient_session(email);
        let _ = self
            .events
            .send(AuthChangeEvent::TokenRefreshed(session.clone()));
        session
    }

    /// Forced logout from another device.
    pub fn push_signed_out(&self) {
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthChangeEvent::SignedOut);
    }

    /// Drops every issued token, as if the server revoked them.
    pub fn revoke_all(&self) {
        self.issued.lock().unwrap().clear();
        *self.current.lock().unwrap() = None;
    }
}

#[async_trait]
impl AuthProvider for FakeProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AuthError::ApiError("Invalid login credentials".to_string())),
            }
        };

        let session = self.issue(&user);
        *self.current.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, AuthError> {
        if self.user_by_email(email).is_some() {
            return Err(AuthError::ApiError("User already registered".to_string()));
        }
        if password.len() < 6 {
            return Err(AuthError::ApiError(
                "Password should be at least 6 characters".to_string(),
            ));
        }

        self.register(email, password);
        let user = self.user_by_email(email).expect("just registered");

        if self.confirm_email_on_sign_up.load(Ordering::SeqCst) {
            return Ok(SignUpResponse {
                user,
                session: None,
            });
        }

        let session = self.issue(&user);
        *self.current.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthChangeEvent::SignedIn(session.clone()));
        Ok(SignUpResponse {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthChangeEvent::SignedOut);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::ApiError("logout failed".to_string()));
        }
        Ok(())
    }

    async fn get_session(&self) -> Option<Session> {
        self.current()
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        if self.fail_set_session.load(Ordering::SeqCst) {
            return Err(AuthError::ApiError("network unreachable".to_string()));
        }

        let issued = self.issued.lock().unwrap().get(access_token).cloned();
        match issued {
            Some(session) if session.refresh_token == refresh_token => {
                *self.current.lock().unwrap() = Some(session.clone());
                let _ = self.events.send(AuthChangeEvent::SignedIn(session.clone()));
                Ok(session)
            }
            _ => Err(AuthError::ApiError("Invalid Refresh Token".to_string())),
        }
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}

pub fn storage() -> StorageService {
    StorageService::new(Arc::new(MemoryStore::new()))
}

pub fn reconciler(provider: &Arc<FakeProvider>, storage: &StorageService) -> AuthReconciler {
    let provider: Arc<dyn AuthProvider> = provider.clone();
    AuthReconciler::new(provider, storage.clone(), SessionCache::new(storage.clone()))
}

/// Polls until `check` holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Gives the listener task time to drain queued notifications.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn user_id(state: &AuthState) -> Option<String> {
    state.user().map(|user| user.id.clone())
}
