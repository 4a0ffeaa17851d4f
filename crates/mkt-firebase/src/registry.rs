//! Admin app registry.
//!
//! Built once at startup and shared by reference. The underlying admin app
//! is constructed on the first [`AdminRegistry::get_or_create`] call and
//! every later call, concurrent or not, observes that same handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::app::AdminApp;
use crate::config::FirebaseConfig;
use crate::error::{FirebaseError, FirebaseResult};

enum ConfigSource {
    /// Read credentials from the environment on first use.
    Env,
    Static(FirebaseConfig),
}

/// Holder of the single admin app handle.
pub struct AdminRegistry {
    source: ConfigSource,
    app: OnceCell<Arc<AdminApp>>,
    constructions: AtomicUsize,
}

impl AdminRegistry {
    /// Registry that reads `FIREBASE_*` variables on first use.
    pub fn from_env() -> Self {
        Self::with_source(ConfigSource::Env)
    }

    /// Registry with explicit configuration.
    pub fn with_config(config: FirebaseConfig) -> Self {
        Self::with_source(ConfigSource::Static(config))
    }

    fn with_source(source: ConfigSource) -> Self {
        Self {
            source,
            app: OnceCell::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Return the shared admin app, constructing it on first call.
    ///
    /// A failed construction stores nothing, so a later call retries.
    pub async fn get_or_create(&self) -> FirebaseResult<Arc<AdminApp>> {
        let app = self
            .app
            .get_or_try_init(|| async {
                let config = match &self.source {
                    ConfigSource::Env => FirebaseConfig::from_env()?,
                    ConfigSource::Static(config) => config.clone(),
                };

                let app = AdminApp::initialize(config)?;
                let constructions = self.constructions.fetch_add(1, Ordering::SeqCst) + 1;

                info!(
                    app = %app.name(),
                    project_id = %app.project_id(),
                    constructions,
                    "Initialized Firebase admin app"
                );
                Ok::<_, FirebaseError>(Arc::new(app))
            })
            .await?;

        Ok(Arc::clone(app))
    }

    /// The handle, if it has been constructed.
    pub fn get(&self) -> Option<Arc<AdminApp>> {
        self.app.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.app.initialized()
    }

    /// How many admin apps this registry has built. Never more than one.
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}
