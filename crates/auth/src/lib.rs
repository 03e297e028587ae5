//! Authentication client for the fitness tracker.
//!
//! Talks to a GoTrue-compatible authentication API (the one Supabase hosts)
//! and covers what the app needs from it: password sign-in, sign-up,
//! sign-out, session restore from a token pair, and a stream of
//! auth-state changes.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// ユーザー情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// セッション情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// サインアップ結果
///
/// When the project requires email confirmation the server answers with the
/// bare user and no session.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    pub user: User,
    pub session: Option<Session>,
}

/// 認証状態の変更イベント
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChangeEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(Session),
}

impl AuthChangeEvent {
    /// The live session carried by the event, `None` for sign-out.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session)
            | Self::TokenRefreshed(session)
            | Self::UserUpdated(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

/// クライアントオプション
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Refresh an expired access token when restoring a session.
    pub auto_refresh_token: bool,
    /// Keep the last session in memory so `get_session` can return it.
    pub persist_session: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    exp: i64,
}

const EVENT_CAPACITY: usize = 16;

/// Auth クライアント
pub struct AuthClient {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl AuthClient {
    /// 新しい Auth クライアントを作成
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Builds the HTTP client from the options (request timeout) and then the
    /// auth client on top of it.
    pub fn with_options(url: &str, key: &str, options: AuthOptions) -> Result<Self, AuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;
        Ok(Self::new(url, key, http_client, options))
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// 認証状態の変更通知を受け取るためのレシーバーを取得
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthChangeEvent) {
        if self.events.send(event).is_err() {
            debug!("No auth state listeners registered");
        }
    }

    async fn store_session(&self, session: &Session) {
        if self.options.persist_session {
            let mut write_guard = self.current_session.write().await;
            *write_guard = Some(session.clone());
        }
    }

    /// ユーザー登録
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, AuthError> {
        let url = self.auth_url("/signup");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let body = response.json::<serde_json::Value>().await?;
        let result = parse_sign_up(body)?;

        if let Some(ref session) = result.session {
            self.store_session(session).await;
            info!("Signed up user {}", session.user.id);
            self.emit(AuthChangeEvent::SignedIn(session.clone()));
        } else {
            info!("Signed up user {} (confirmation pending)", result.user.id);
        }

        Ok(result)
    }

    /// メール・パスワードでログイン
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = self.auth_url("/token?grant_type=password");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let session: Session = response.json().await?;

        self.store_session(&session).await;
        info!("Signed in user {}", session.user.id);
        self.emit(AuthChangeEvent::SignedIn(session.clone()));

        Ok(session)
    }

    /// 現在のセッションを取得
    pub async fn get_session(&self) -> Option<Session> {
        let read_guard = self.current_session.read().await;
        read_guard.clone()
    }

    /// Restores a session from a stored token pair.
    ///
    /// The access token is decoded locally (signature is not checked, the
    /// server does that on use). An expired token is exchanged through the
    /// refresh grant, otherwise the user is fetched with the token as-is.
    pub async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        let claims = decode_access_token(access_token)?;
        let now = Utc::now().timestamp();

        if claims.exp <= now {
            if !self.options.auto_refresh_token {
                return Err(AuthError::InvalidToken("access token expired".to_string()));
            }
            debug!("Access token for {} expired, refreshing", claims.sub);
            return self.refresh_with_token(refresh_token).await;
        }

        let user = self.get_user_by_token(access_token).await?;
        if user.id != claims.sub {
            warn!("Token subject {} does not match user {}", claims.sub, user.id);
        }

        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_in: claims.exp - now,
            expires_at: Some(claims.exp),
            token_type: default_token_type(),
            user,
        };

        self.store_session(&session).await;
        self.emit(AuthChangeEvent::SignedIn(session.clone()));

        Ok(session)
    }

    /// セッションをリフレッシュ
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.get_session().await.ok_or(AuthError::MissingSession)?;
        self.refresh_with_token(&session.refresh_token).await
    }

    async fn refresh_with_token(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let url = self.auth_url("/token?grant_type=refresh_token");

        let payload = serde_json::json!({
            "refresh_token": refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let new_session: Session = response.json().await?;

        self.store_session(&new_session).await;
        self.emit(AuthChangeEvent::TokenRefreshed(new_session.clone()));

        Ok(new_session)
    }

    /// サインアウト
    ///
    /// The in-memory session is dropped even when the logout request fails;
    /// the request error is still returned to the caller.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = {
            let mut write_guard = self.current_session.write().await;
            write_guard.take()
        };

        let result = match session {
            Some(session) => self.logout(&session.access_token).await,
            None => Ok(()),
        };

        self.emit(AuthChangeEvent::SignedOut);
        result
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.auth_url("/logout");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        Ok(())
    }

    /// トークンを使ってユーザー情報を取得（内部メソッド）
    async fn get_user_by_token(&self, token: &str) -> Result<User, AuthError> {
        let url = self.auth_url("/user");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let user: User = response.json().await?;

        Ok(user)
    }
}

fn parse_sign_up(body: serde_json::Value) -> Result<SignUpResponse, AuthError> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok(SignUpResponse {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user: User = serde_json::from_value(body)?;
    Ok(SignUpResponse { user, session: None })
}

fn decode_access_token(token: &str) -> Result<AccessTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| AuthError::InvalidToken(err.to_string()))
}
