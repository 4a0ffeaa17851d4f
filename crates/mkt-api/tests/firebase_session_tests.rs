//! Session resolution against a mocked Firebase key set.

mod common;

use axum::http::{header, HeaderMap, HeaderValue};
use mkt_api::{resolve_session, ApiError, FirebaseSessionResolver};
use mkt_firebase::{AdminRegistry, FirebaseError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    install_crypto_provider, mount_access_token, mount_jwks, mount_lookup, sign_token,
    test_firebase_config, user_record,
};

async fn resolver_for(server: &MockServer) -> FirebaseSessionResolver {
    install_crypto_provider();
    let registry = AdminRegistry::with_config(test_firebase_config(&server.uri()));
    let app = registry.get_or_create().await.unwrap();
    FirebaseSessionResolver::new(app.auth(), "session")
}

fn with_authorization(value: String) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
}

fn with_cookie(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; session={}", value)).unwrap(),
    );
    headers
}

#[tokio::test]
async fn test_no_token_resolves_to_none() {
    let server = MockServer::start().await;
    let resolver = resolver_for(&server).await;

    let session = resolve_session(&resolver, &HeaderMap::new()).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_valid_cookie_resolves_subject() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let resolver = resolver_for(&server).await;

    let session = resolve_session(&resolver, &with_cookie(&sign_token("collector-7")))
        .await
        .unwrap()
        .expect("session resolved");

    assert_eq!(session.user_id, "collector-7");
    assert_eq!(session.email.as_deref(), Some("collector-7@example.com"));
    assert!(session.email_verified);
    assert!(session.account.is_none());
    assert!(session.expires_at > session.issued_at);
}

#[tokio::test]
async fn test_bearer_header_fallback() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let resolver = resolver_for(&server).await;

    let headers = with_authorization(format!("Bearer {}", sign_token("collector-8")));

    let session = resolve_session(&resolver, &headers).await.unwrap().unwrap();
    assert_eq!(session.user_id, "collector-8");
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let resolver = resolver_for(&server).await;

    for scheme in ["bearer", "BEARER"] {
        let headers = with_authorization(format!("{} {}", scheme, sign_token("collector-9")));
        let session = resolve_session(&resolver, &headers).await.unwrap().unwrap();
        assert_eq!(session.user_id, "collector-9");
    }
}

#[tokio::test]
async fn test_other_authorization_scheme_is_ignored() {
    let server = MockServer::start().await;
    let resolver = resolver_for(&server).await;

    let headers = with_authorization("Basic dXNlcjpwYXNz".to_string());
    assert!(resolve_session(&resolver, &headers).await.unwrap().is_none());
}

#[tokio::test]
async fn test_account_resolution_attaches_account() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    mount_access_token(&server).await;
    mount_lookup(&server, 200, user_record("collector-7"), 1).await;
    let resolver = resolver_for(&server).await.with_account_resolution(true);

    let session = resolve_session(&resolver, &with_cookie(&sign_token("collector-7")))
        .await
        .unwrap()
        .unwrap();

    let account = session.account.expect("account attached");
    assert_eq!(account.uid, "collector-7");
    assert_eq!(account.display_name.as_deref(), Some("Collector Seven"));
}

#[tokio::test]
async fn test_account_lookup_failure_is_provider_error() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    mount_access_token(&server).await;
    mount_lookup(&server, 500, serde_json::json!({ "error": "backend" }), 1).await;
    let resolver = resolver_for(&server).await.with_account_resolution(true);

    let err = resolve_session(&resolver, &with_cookie(&sign_token("collector-7")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Provider(FirebaseError::RequestFailed(_))));
}

#[tokio::test]
async fn test_rejected_admin_token_is_not_retried() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    mount_access_token(&server).await;
    mount_lookup(&server, 401, serde_json::json!({ "error": "UNAUTHENTICATED" }), 1).await;
    let resolver = resolver_for(&server).await.with_account_resolution(true);

    let err = resolve_session(&resolver, &with_cookie(&sign_token("collector-7")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Provider(FirebaseError::Auth(_))));
}

#[tokio::test]
async fn test_rejected_token_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;
    let resolver = resolver_for(&server).await;

    let mut token = sign_token("collector-7");
    token.push_str("tampered");

    let session = resolve_session(&resolver, &with_cookie(&token)).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_key_set_outage_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let resolver = resolver_for(&server).await;

    let err = resolve_session(&resolver, &with_cookie(&sign_token("collector-7")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Provider(_)));
}
