//! Application state.

use std::sync::Arc;

use mkt_firebase::AdminRegistry;

use crate::config::ApiConfig;
use crate::session::{FirebaseSessionResolver, SessionResolver};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    /// Built once at startup; the only owner of the admin app.
    pub admin: Arc<AdminRegistry>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Initializes the admin app eagerly so bad credentials stop startup.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let admin = Arc::new(AdminRegistry::from_env());
        let app = admin.get_or_create().await?;

        let resolver = FirebaseSessionResolver::new(app.auth(), config.session_cookie.clone())
            .with_account_resolution(config.resolve_accounts);

        Ok(Self::from_parts(config, admin, Arc::new(resolver)))
    }

    /// Assemble state from already-built services.
    pub fn from_parts(
        config: ApiConfig,
        admin: Arc<AdminRegistry>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            config,
            admin,
            sessions,
        }
    }
}
