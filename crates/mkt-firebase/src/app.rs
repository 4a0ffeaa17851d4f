//! The shared admin app handle.

use std::sync::Arc;
use std::time::Duration;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;

use crate::auth::AdminAuth;
use crate::config::FirebaseConfig;
use crate::error::{FirebaseError, FirebaseResult};
use crate::keys::KeyCache;

/// Name of the single admin app.
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Administrative client handle.
///
/// Only [`AdminRegistry`](crate::registry::AdminRegistry) constructs these,
/// and it constructs at most one per registry. Identity is `Arc` identity.
pub struct AdminApp {
    name: String,
    config: FirebaseConfig,
    http: Client,
    keys: Arc<KeyCache>,
    credentials: Arc<dyn TokenProvider>,
}

impl AdminApp {
    /// Build the app from validated configuration.
    ///
    /// Parses the service account key, so a key that passed the PEM check
    /// but is not a usable RSA key fails here.
    pub(crate) fn initialize(config: FirebaseConfig) -> FirebaseResult<Self> {
        let service_account = CustomServiceAccount::from_json(
            &config
                .credentials
                .to_service_account_json(&config.endpoints.token_uri),
        )
        .map_err(|e| {
            FirebaseError::configuration(format!("Invalid service account credentials: {}", e))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("mkt-firebase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirebaseError::Network)?;

        let keys = Arc::new(KeyCache::new(http.clone(), config.endpoints.jwks_url.clone()));
        let credentials: Arc<dyn TokenProvider> = Arc::new(service_account);

        Ok(Self {
            name: DEFAULT_APP_NAME.to_string(),
            config,
            http,
            keys,
            credentials,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        self.config.project_id()
    }

    pub fn client_email(&self) -> &str {
        &self.config.credentials.client_email
    }

    /// Auth sub-client. Shares this app's HTTP client, key cache and credentials.
    pub fn auth(&self) -> AdminAuth {
        AdminAuth::new(
            self.config.project_id().to_string(),
            self.config.endpoints.identity_toolkit_url.clone(),
            self.http.clone(),
            Arc::clone(&self.keys),
            Arc::clone(&self.credentials),
        )
    }
}

impl std::fmt::Debug for AdminApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApp")
            .field("name", &self.name)
            .field("project_id", &self.project_id())
            .field("client_email", &self.client_email())
            .finish()
    }
}
