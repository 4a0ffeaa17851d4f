//! Firebase admin configuration.
//!
//! Credentials come from three environment variables:
//! `FIREBASE_PROJECT_ID`, `FIREBASE_CLIENT_EMAIL` and `FIREBASE_PRIVATE_KEY`.
//! Hosting platforms usually store the PEM key on a single line with literal
//! `\n` sequences; those are unescaped on load.

use std::fmt;
use std::time::Duration;

use crate::error::{FirebaseError, FirebaseResult};

/// Google JWKS URL for Firebase ID tokens.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Identity Toolkit REST base URL.
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// OAuth token endpoint for service account assertions.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const PROJECT_ID_VAR: &str = "FIREBASE_PROJECT_ID";
pub const CLIENT_EMAIL_VAR: &str = "FIREBASE_CLIENT_EMAIL";
pub const PRIVATE_KEY_VAR: &str = "FIREBASE_PRIVATE_KEY";

// =============================================================================
// Credentials
// =============================================================================

/// Service account credentials for the admin app.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceAccountCredentials {
    pub project_id: String,
    pub client_email: String,
    private_key: String,
}

impl ServiceAccountCredentials {
    /// Build and validate credentials.
    pub fn new(
        project_id: impl Into<String>,
        client_email: impl Into<String>,
        private_key: impl AsRef<str>,
    ) -> FirebaseResult<Self> {
        let project_id = project_id.into().trim().to_string();
        let client_email = client_email.into().trim().to_string();
        let private_key = normalize_private_key(private_key.as_ref());

        if project_id.is_empty() {
            return Err(FirebaseError::configuration(format!(
                "{} cannot be empty",
                PROJECT_ID_VAR
            )));
        }

        if !client_email.contains('@') {
            return Err(FirebaseError::configuration(format!(
                "{} is not a service account email",
                CLIENT_EMAIL_VAR
            )));
        }

        if !private_key.contains("-----BEGIN") || !private_key.contains("PRIVATE KEY-----") {
            return Err(FirebaseError::configuration(format!(
                "{} is not a PEM encoded private key",
                PRIVATE_KEY_VAR
            )));
        }

        Ok(Self {
            project_id,
            client_email,
            private_key,
        })
    }

    /// Load credentials from environment variables.
    pub fn from_env() -> FirebaseResult<Self> {
        Self::new(
            required_var(PROJECT_ID_VAR)?,
            required_var(CLIENT_EMAIL_VAR)?,
            required_var(PRIVATE_KEY_VAR)?,
        )
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Service account key file contents, as understood by gcp_auth.
    pub(crate) fn to_service_account_json(&self, token_uri: &str) -> String {
        serde_json::json!({
            "type": "service_account",
            "project_id": self.project_id,
            "client_email": self.client_email,
            "private_key": self.private_key,
            "token_uri": token_uri,
        })
        .to_string()
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"[redacted]")
            .finish()
    }
}

fn required_var(name: &str) -> FirebaseResult<String> {
    let value = std::env::var(name)
        .map_err(|_| FirebaseError::configuration(format!("{} must be set", name)))?;

    if value.trim().is_empty() {
        return Err(FirebaseError::configuration(format!("{} cannot be empty", name)));
    }

    Ok(value)
}

/// Unescape `\n` and strip surrounding quotes left by `.env` files.
fn normalize_private_key(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .replace("\\n", "\n")
        .trim()
        .to_string()
}

// =============================================================================
// Endpoints
// =============================================================================

/// Remote endpoints used by the admin app. Overridable for the emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub jwks_url: String,
    pub identity_toolkit_url: String,
    pub token_uri: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            jwks_url: std::env::var("FIREBASE_JWKS_URL")
                .unwrap_or_else(|_| DEFAULT_JWKS_URL.to_string()),
            identity_toolkit_url: std::env::var("FIREBASE_IDENTITY_TOOLKIT_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
            token_uri: std::env::var("FIREBASE_TOKEN_URI")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URI.to_string()),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Admin app configuration.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub credentials: ServiceAccountCredentials,
    pub endpoints: Endpoints,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> FirebaseResult<Self> {
        let credentials = ServiceAccountCredentials::from_env()?;

        let timeout_secs: u64 = std::env::var("FIREBASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            credentials,
            endpoints: Endpoints::from_env(),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(5),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }
}
