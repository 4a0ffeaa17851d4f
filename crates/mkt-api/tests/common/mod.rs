//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Response};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mkt_api::{
    create_router, ApiConfig, ApiError, ApiResult, AppState, FirebaseSessionResolver,
    SessionResolver,
};
use mkt_firebase::{AdminRegistry, Endpoints, FirebaseConfig, FirebaseError, ServiceAccountCredentials};
use mkt_models::SessionDescriptor;

pub const TEST_PRIVATE_KEY: &str =
    include_str!("../../../mkt-firebase/testdata/service_account_key.pem");
pub const TEST_JWKS: &str = include_str!("../../../mkt-firebase/testdata/jwks.json");
pub const TEST_KEY_ID: &str = "test-key-1";
pub const TEST_PROJECT_ID: &str = "demo-marketplace";
pub const TEST_ACCESS_TOKEN: &str = "ya29.test-admin-token";

/// Resolver returning a fixed outcome.
pub enum StubResolver {
    Anonymous,
    Session(SessionDescriptor),
    ProviderDown,
}

#[async_trait]
impl SessionResolver for StubResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> ApiResult<Option<SessionDescriptor>> {
        match self {
            StubResolver::Anonymous => Ok(None),
            StubResolver::Session(session) => Ok(Some(session.clone())),
            StubResolver::ProviderDown => Err(ApiError::from(FirebaseError::RequestFailed(
                "HTTP 503: key set unavailable".to_string(),
            ))),
        }
    }
}

pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub fn session_for(user_id: &str) -> SessionDescriptor {
    let now = Utc::now();
    SessionDescriptor::new(user_id, now, now + Duration::hours(1))
}

pub fn test_firebase_config(server_uri: &str) -> FirebaseConfig {
    let credentials = ServiceAccountCredentials::new(
        TEST_PROJECT_ID,
        "firebase-adminsdk@demo-marketplace.iam.gserviceaccount.com",
        TEST_PRIVATE_KEY,
    )
    .expect("test credentials are valid");

    FirebaseConfig::new(credentials).with_endpoints(Endpoints {
        jwks_url: format!("{}/jwks", server_uri),
        identity_toolkit_url: format!("{}/identitytoolkit/v1", server_uri),
        token_uri: format!("{}/token", server_uri),
    })
}

pub fn test_state(resolver: StubResolver) -> (AppState, Arc<AdminRegistry>) {
    install_crypto_provider();
    let registry = Arc::new(AdminRegistry::with_config(test_firebase_config(
        "http://127.0.0.1:9",
    )));
    let state = AppState::from_parts(ApiConfig::default(), Arc::clone(&registry), Arc::new(resolver));
    (state, registry)
}

pub fn test_router(resolver: StubResolver) -> Router {
    create_router(test_state(resolver).0, None)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TEST_JWKS))
        .mount(server)
        .await;
}

pub fn sign_token(sub: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "iss": format!("https://securetoken.google.com/{}", TEST_PROJECT_ID),
        "aud": TEST_PROJECT_ID,
        "sub": sub,
        "email": format!("{}@example.com", sub),
        "email_verified": true,
        "iat": now - 10,
        "exp": now + 3600,
        "auth_time": now - 10,
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KEY_ID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).expect("test key parses");
    encode(&header, &claims, &key).expect("token encodes")
}

/// Router backed by the Firebase resolver, with every provider endpoint on
/// `server`.
pub async fn firebase_router(server: &MockServer, resolve_accounts: bool) -> Router {
    install_crypto_provider();
    let registry = Arc::new(AdminRegistry::with_config(test_firebase_config(&server.uri())));
    let app = registry.get_or_create().await.expect("admin app initializes");
    let resolver =
        FirebaseSessionResolver::new(app.auth(), "session").with_account_resolution(resolve_accounts);
    let state = AppState::from_parts(ApiConfig::default(), registry, Arc::new(resolver));
    create_router(state, None)
}

pub fn lookup_path() -> String {
    format!(
        "/identitytoolkit/v1/projects/{}/accounts:lookup",
        TEST_PROJECT_ID
    )
}

pub async fn mount_access_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": TEST_ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

/// Answer account lookups with `status` and `body`, expecting `times` calls.
pub async fn mount_lookup(server: &MockServer, status: u16, body: serde_json::Value, times: u64) {
    Mock::given(method("POST"))
        .and(path(lookup_path()))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Identity Toolkit record for `uid`.
pub fn user_record(uid: &str) -> serde_json::Value {
    serde_json::json!({
        "users": [{
            "localId": uid,
            "email": format!("{}@example.com", uid),
            "emailVerified": true,
            "displayName": "Collector Seven",
            "createdAt": "1700000000000"
        }]
    })
}
