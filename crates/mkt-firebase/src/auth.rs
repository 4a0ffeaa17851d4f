//! Firebase Auth admin operations.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use mkt_models::Account;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FirebaseError, FirebaseResult};
use crate::keys::KeyCache;
use crate::metrics::{record_request, record_token_verification};

/// Firebase token issuer prefix.
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Tolerated clock skew for `iat` and `auth_time`, in seconds.
const CLOCK_SKEW_SECS: i64 = 60;

/// Longest user ID Firebase issues.
const MAX_UID_LEN: usize = 128;

/// OAuth scopes required by the Identity Toolkit admin endpoints.
pub const ADMIN_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/identitytoolkit",
];

/// Decoded Firebase ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iss: String,
    /// Firebase project ID
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: Option<i64>,
}

impl TokenClaims {
    /// Get user ID (alias for sub).
    pub fn uid(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

// =============================================================================
// Identity Toolkit payloads
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    local_id: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    display_name: Option<String>,
    photo_url: Option<String>,
    #[serde(default)]
    disabled: bool,
    /// Milliseconds since epoch, as a string.
    created_at: Option<String>,
    last_login_at: Option<String>,
}

fn parse_millis(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

impl From<UserRecord> for Account {
    fn from(user: UserRecord) -> Self {
        Self {
            created_at: parse_millis(user.created_at.as_deref()),
            last_login_at: parse_millis(user.last_login_at.as_deref()),
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.display_name,
            photo_url: user.photo_url,
            disabled: user.disabled,
        }
    }
}

// =============================================================================
// Admin auth client
// =============================================================================

/// Auth sub-client derived from an [`AdminApp`](crate::app::AdminApp).
#[derive(Clone)]
pub struct AdminAuth {
    project_id: String,
    identity_toolkit_url: String,
    http: Client,
    keys: Arc<KeyCache>,
    credentials: Arc<dyn TokenProvider>,
}

impl AdminAuth {
    pub(crate) fn new(
        project_id: String,
        identity_toolkit_url: String,
        http: Client,
        keys: Arc<KeyCache>,
        credentials: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            project_id,
            identity_toolkit_url,
            http,
            keys,
            credentials,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Verify a Firebase ID token.
    ///
    /// Rejections of the token itself are [`FirebaseError::InvalidToken`];
    /// failures to fetch the signing keys surface as their own variants.
    pub async fn verify_id_token(&self, token: &str) -> FirebaseResult<TokenClaims> {
        let result = self.verify_id_token_inner(token).await;
        record_token_verification(match &result {
            Ok(_) => "valid",
            Err(e) if e.is_invalid_token() => "invalid",
            Err(_) => "error",
        });
        result
    }

    async fn verify_id_token_inner(&self, token: &str) -> FirebaseResult<TokenClaims> {
        let header = decode_header(token)
            .map_err(|e| FirebaseError::invalid_token(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(FirebaseError::invalid_token(format!(
                "Unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| FirebaseError::invalid_token("Token missing key ID"))?;

        let key = self
            .keys
            .get_key(&kid)
            .await?
            .ok_or_else(|| FirebaseError::invalid_token("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);

        let claims = decode::<TokenClaims>(token, &key, &validation)
            .map_err(|e| FirebaseError::invalid_token(format!("Token validation failed: {}", e)))?
            .claims;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(FirebaseError::invalid_token("Token has an invalid subject"));
        }

        let now = Utc::now().timestamp();
        if claims.iat > now + CLOCK_SKEW_SECS {
            return Err(FirebaseError::invalid_token("Token issued in the future"));
        }
        if claims.auth_time.is_some_and(|t| t > now + CLOCK_SKEW_SECS) {
            return Err(FirebaseError::invalid_token("Token authenticated in the future"));
        }

        Ok(claims)
    }

    /// Access token for the admin REST endpoints.
    ///
    /// gcp_auth caches tokens per scope set and refreshes them on expiry.
    async fn access_token(&self) -> FirebaseResult<String> {
        let token = self.credentials.token(ADMIN_SCOPES).await.map_err(|e| {
            FirebaseError::auth_error(format!("Failed to obtain admin access token: {}", e))
        })?;
        Ok(token.as_str().to_string())
    }

    /// Look up the account record for a user ID.
    ///
    /// A rejected access token surfaces as [`FirebaseError::Auth`]. The
    /// request is not retried, since the provider would hand back the same
    /// cached token.
    pub async fn lookup_account(&self, uid: &str) -> FirebaseResult<Option<Account>> {
        let url = format!(
            "{}/projects/{}/accounts:lookup",
            self.identity_toolkit_url, self.project_id
        );
        let token = self.access_token().await?;
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&LookupRequest { local_id: [uid] })
            .send()
            .await?;

        let status = response.status();
        record_request(
            "accounts_lookup",
            status.as_u16(),
            start.elapsed().as_secs_f64() * 1000.0,
        );

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Account lookup failed");
            return Err(FirebaseError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", url, text),
            ));
        }

        let text = response.text().await?;
        parse_lookup_response(&text)
    }
}

fn parse_lookup_response(body: &str) -> FirebaseResult<Option<Account>> {
    // An unknown user comes back as `{}` with no `users` field.
    let response: LookupResponse = serde_json::from_str(body)?;
    Ok(response.users.into_iter().next().map(Account::from))
}
