//! The remote authentication provider as seen by the app core

use async_trait::async_trait;
use tokio::sync::broadcast;

use fitness_tracker_auth::{AuthChangeEvent, AuthClient, AuthError, Session, SignUpResponse};

/// Operations the app consumes from the hosted authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The provider's own notion of the current session, if it kept one.
    async fn get_session(&self) -> Option<Session>;

    async fn set_session(&self, access_token: &str, refresh_token: &str)
        -> Result<Session, AuthError>;

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent>;
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        AuthClient::sign_in_with_password(self, email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, AuthError> {
        AuthClient::sign_up(self, email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        AuthClient::sign_out(self).await
    }

    async fn get_session(&self) -> Option<Session> {
        AuthClient::get_session(self).await
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        AuthClient::set_session(self, access_token, refresh_token).await
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        AuthClient::on_auth_state_change(self)
    }
}
