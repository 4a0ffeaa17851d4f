//! Shared fixtures for unit tests.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{Endpoints, FirebaseConfig, ServiceAccountCredentials};
use crate::registry::AdminRegistry;

/// RSA key used both as the service account key and to sign test tokens.
pub const TEST_PRIVATE_KEY: &str = include_str!("../testdata/service_account_key.pem");

/// JWKS document holding the public half of [`TEST_PRIVATE_KEY`].
pub const TEST_JWKS: &str = include_str!("../testdata/jwks.json");

pub const TEST_KEY_ID: &str = "test-key-1";
pub const TEST_PROJECT_ID: &str = "demo-marketplace";

pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub fn test_credentials() -> ServiceAccountCredentials {
    ServiceAccountCredentials::new(
        TEST_PROJECT_ID,
        "firebase-adminsdk@demo-marketplace.iam.gserviceaccount.com",
        TEST_PRIVATE_KEY,
    )
    .expect("test credentials are valid")
}

pub fn test_config(server_uri: &str) -> FirebaseConfig {
    FirebaseConfig::new(test_credentials()).with_endpoints(Endpoints {
        jwks_url: format!("{}/jwks", server_uri),
        identity_toolkit_url: format!("{}/identitytoolkit/v1", server_uri),
        token_uri: format!("{}/token", server_uri),
    })
}

pub fn test_registry(server_uri: &str) -> AdminRegistry {
    install_crypto_provider();
    AdminRegistry::with_config(test_config(server_uri))
}

/// Serve the test JWKS, expecting exactly `times` fetches.
pub async fn mount_jwks(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TEST_JWKS))
        .expect(times)
        .mount(server)
        .await;
}

/// Claims for a token issued to `sub` that is valid for an hour.
pub fn valid_claims(sub: &str) -> serde_json::Value {
    let now = Utc::now().timestamp();
    serde_json::json!({
        "iss": format!("https://securetoken.google.com/{}", TEST_PROJECT_ID),
        "aud": TEST_PROJECT_ID,
        "sub": sub,
        "email": format!("{}@example.com", sub),
        "email_verified": true,
        "iat": now - 10,
        "exp": now + 3600,
        "auth_time": now - 10,
    })
}

pub fn sign_token(claims: &serde_json::Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).expect("test key parses");
    encode(&header, claims, &key).expect("token encodes")
}

/// Access token handed out by the mocked OAuth endpoint.
pub const TEST_ACCESS_TOKEN: &str = "ya29.test-admin-token";

/// Identity Toolkit lookup path for [`TEST_PROJECT_ID`].
pub fn lookup_path() -> String {
    format!(
        "/identitytoolkit/v1/projects/{}/accounts:lookup",
        TEST_PROJECT_ID
    )
}

/// Serve admin access tokens, expecting exactly `times` grants.
pub async fn mount_access_token(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": TEST_ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .expect(times)
        .mount(server)
        .await;
}
