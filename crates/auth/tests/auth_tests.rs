use fitness_tracker_auth::{AuthChangeEvent, AuthClient, AuthError, AuthOptions};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_json(access_token: &str, refresh_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh_token,
        "user": {
            "id": "test_user_id",
            "email": "test@example.com",
            "role": "authenticated"
        }
    })
}

fn client(uri: &str) -> AuthClient {
    AuthClient::new(uri, "test_anon_key", reqwest::Client::new(), AuthOptions::default())
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "test_anon_key"))
        .and(body_json(json!({
            "email": "test@example.com",
            "password": "password123"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("test_access_token", "test_refresh_token")),
        )
        .mount(&mock_server)
        .await;

    let auth_client = client(&mock_server.uri());

    let session = auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(session.access_token, "test_access_token");
    assert_eq!(session.user.id, "test_user_id");
    assert_eq!(session.user.email, Some("test@example.com".to_string()));
    assert_eq!(auth_client.get_session().await, Some(session));
}

#[tokio::test]
async fn test_sign_up_duplicate_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "msg": "User already registered"
        })))
        .mount(&mock_server)
        .await;

    let auth_client = client(&mock_server.uri());
    let result = auth_client.sign_up("test@example.com", "password123").await;

    assert!(matches!(
        result,
        Err(AuthError::ApiError(ref body)) if body.contains("already registered")
    ));
}

#[tokio::test]
async fn test_sign_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("test_access_token", "test_refresh_token")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer test_access_token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth_client = client(&mock_server.uri());
    auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    let result = auth_client.sign_out().await;

    assert!(result.is_ok());
    assert!(auth_client.get_session().await.is_none());
}

#[tokio::test]
async fn test_sign_out_without_session_is_local_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let auth_client = client(&mock_server.uri());
    let mut events = auth_client.on_auth_state_change();

    assert!(auth_client.sign_out().await.is_ok());
    assert_eq!(events.recv().await.unwrap(), AuthChangeEvent::SignedOut);
}

#[tokio::test]
async fn test_refresh_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("old_access_token", "old_refresh_token")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "old_refresh_token" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("new_access_token", "new_refresh_token")),
        )
        .mount(&mock_server)
        .await;

    let auth_client = client(&mock_server.uri());
    auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    let response = auth_client.refresh_session().await.unwrap();

    assert_eq!(response.access_token, "new_access_token");
    assert_eq!(response.refresh_token, "new_refresh_token");
}

#[tokio::test]
async fn test_refresh_session_without_session() {
    let auth_client = client("http://localhost:1");
    let result = auth_client.refresh_session().await;
    assert!(matches!(result, Err(AuthError::MissingSession)));
}
