//! Firebase Authentication client against mocked REST endpoints.

use httpmock::prelude::*;
use serde_json::json;

use societas_config::IdentityConfig;
use societas_identity::{FirebaseIdentity, IdentityError, IdentityProvider};

fn identity_for(server: &MockServer) -> FirebaseIdentity {
    let config = IdentityConfig {
        api_key: Some("web-key".to_string()),
        identity_base_url: server.url("/identity/v1"),
        token_base_url: server.url("/token/v1"),
        emulator_host: None,
    };
    FirebaseIdentity::new(&config)
}

#[tokio::test]
async fn sign_up_returns_session_tokens() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/identity/v1/accounts:signUp")
                .header("x-goog-api-key", "web-key")
                .json_body(json!({
                    "email": "ada@example.com",
                    "password": "secret1",
                    "returnSecureToken": true
                }));
            then.status(200).json_body(json!({
                "kind": "identitytoolkit#SignupNewUserResponse",
                "idToken": "id-token",
                "email": "ada@example.com",
                "refreshToken": "refresh-token",
                "expiresIn": "3600",
                "localId": "uid-ada"
            }));
        })
        .await;

    let session = identity_for(&server)
        .sign_up("ada@example.com", "secret1")
        .await
        .expect("sign up succeeds");

    mock.assert_async().await;
    assert_eq!(session.uid, "uid-ada");
    assert_eq!(session.id_token, "id-token");
    assert_eq!(session.refresh_token, "refresh-token");
    assert_eq!(session.expires_in, Some(3600));
}

#[tokio::test]
async fn sign_in_maps_invalid_credentials() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/identity/v1/accounts:signInWithPassword");
            then.status(400).json_body(json!({
                "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS", "errors": [] }
            }));
        })
        .await;

    let error = identity_for(&server)
        .sign_in("ada@example.com", "wrong-password")
        .await
        .expect_err("sign in must fail");
    assert!(matches!(error, IdentityError::InvalidCredentials));
}

#[tokio::test]
async fn sign_up_maps_existing_email() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/identity/v1/accounts:signUp");
            then.status(400).json_body(json!({
                "error": { "code": 400, "message": "EMAIL_EXISTS" }
            }));
        })
        .await;

    let error = identity_for(&server)
        .sign_up("ada@example.com", "secret1")
        .await
        .expect_err("sign up must fail");
    assert!(matches!(error, IdentityError::EmailExists));
}

#[tokio::test]
async fn refresh_exchanges_refresh_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token/v1/token")
                .header("x-goog-api-key", "web-key")
                .json_body(json!({
                    "grant_type": "refresh_token",
                    "refresh_token": "refresh-token"
                }));
            then.status(200).json_body(json!({
                "expires_in": "3600",
                "token_type": "Bearer",
                "refresh_token": "refresh-token-2",
                "id_token": "id-token-2",
                "user_id": "uid-ada",
                "project_id": "1234"
            }));
        })
        .await;

    let tokens = identity_for(&server)
        .refresh("refresh-token")
        .await
        .expect("refresh succeeds");

    mock.assert_async().await;
    assert_eq!(tokens.uid, "uid-ada");
    assert_eq!(tokens.id_token, "id-token-2");
    assert_eq!(tokens.refresh_token, "refresh-token-2");
}

#[tokio::test]
async fn refresh_maps_expired_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token/v1/token");
            then.status(400).json_body(json!({
                "error": { "code": 400, "message": "TOKEN_EXPIRED", "status": "INVALID_ARGUMENT" }
            }));
        })
        .await;

    let error = identity_for(&server)
        .refresh("stale")
        .await
        .expect_err("refresh must fail");
    assert!(matches!(error, IdentityError::TokenExpired));
}

#[tokio::test]
async fn verify_token_resolves_account() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/identity/v1/accounts:lookup")
                .json_body(json!({ "idToken": "id-token" }));
            then.status(200).json_body(json!({
                "kind": "identitytoolkit#GetAccountInfoResponse",
                "users": [{
                    "localId": "uid-ada",
                    "email": "ada@example.com",
                    "emailVerified": true,
                    "displayName": "Ada",
                    "photoUrl": "https://example.com/ada.png"
                }]
            }));
        })
        .await;

    let user = identity_for(&server)
        .verify_token("id-token")
        .await
        .expect("token verifies");
    assert_eq!(user.uid, "uid-ada");
    assert!(user.email_verified);
    assert_eq!(user.display_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn verify_token_rejects_forged_tokens_and_disabled_accounts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/identity/v1/accounts:lookup")
                .json_body(json!({ "idToken": "forged" }));
            then.status(400).json_body(json!({
                "error": { "code": 400, "message": "INVALID_ID_TOKEN" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/identity/v1/accounts:lookup")
                .json_body(json!({ "idToken": "disabled" }));
            then.status(200).json_body(json!({
                "users": [{ "localId": "uid-x", "disabled": true }]
            }));
        })
        .await;

    let identity = identity_for(&server);
    assert!(matches!(
        identity.verify_token("forged").await,
        Err(IdentityError::InvalidToken)
    ));
    assert!(matches!(
        identity.verify_token("disabled").await,
        Err(IdentityError::UserDisabled)
    ));
}

#[tokio::test]
async fn missing_api_key_fails_without_network() {
    std::env::remove_var("FIREBASE_API_KEY");
    let config = IdentityConfig {
        api_key: None,
        identity_base_url: "http://127.0.0.1:9".to_string(),
        token_base_url: "http://127.0.0.1:9".to_string(),
        emulator_host: None,
    };
    let identity = FirebaseIdentity::new(&config);
    assert!(matches!(
        identity.verify_token("anything").await,
        Err(IdentityError::NotConfigured)
    ));
}

#[tokio::test]
async fn transport_errors_do_not_carry_the_api_key() {
    let config = IdentityConfig {
        api_key: Some("SUPERSECRETKEY".to_string()),
        identity_base_url: "http://127.0.0.1:1/identity/v1".to_string(),
        token_base_url: "http://127.0.0.1:1/token/v1".to_string(),
        emulator_host: None,
    };
    let identity = FirebaseIdentity::new(&config);

    let error = identity
        .sign_in("ada@example.com", "secret1")
        .await
        .expect_err("nothing listens on port 1");

    assert!(matches!(error, IdentityError::Transport(_)));
    let rendered = format!("{error} {error:?}");
    assert!(!rendered.contains("SUPERSECRETKEY"), "{rendered}");
    assert!(!rendered.contains("127.0.0.1:1"), "{rendered}");
}
