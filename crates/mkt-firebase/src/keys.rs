//! Cached signing keys for ID token verification.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{FirebaseError, FirebaseResult};
use crate::metrics::record_key_refresh;

/// Key set cache TTL.
const KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between fetch attempts, successful or not.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

#[derive(Default)]
struct KeySet {
    keys: HashMap<String, DecodingKey>,
    refreshed_at: Option<Instant>,
    attempted_at: Option<Instant>,
    last_failure: Option<String>,
}

impl KeySet {
    fn is_stale(&self) -> bool {
        self.refreshed_at
            .map_or(true, |at| at.elapsed() > KEY_SET_TTL)
    }

    /// Answer from what is cached while another fetch is not yet allowed.
    /// A recent failed fetch is reported rather than treated as an
    /// unknown key.
    fn without_refresh(&self, kid: &str) -> FirebaseResult<Option<DecodingKey>> {
        if let Some(key) = self.keys.get(kid) {
            return Ok(Some(key.clone()));
        }
        match &self.last_failure {
            Some(reason) => Err(FirebaseError::RequestFailed(format!(
                "Signing keys unavailable: {}",
                reason
            ))),
            None => Ok(None),
        }
    }

    fn refresh_due(&self) -> bool {
        self.attempted_at
            .map_or(true, |at| at.elapsed() >= MIN_REFRESH_INTERVAL)
    }
}

/// Lazily fetched, periodically refreshed JWKS key set.
pub struct KeyCache {
    http: Client,
    url: String,
    state: RwLock<KeySet>,
    refresh_lock: Mutex<()>,
}

impl KeyCache {
    /// Create an empty cache. Keys are fetched on first use.
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            state: RwLock::new(KeySet::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Get the decoding key for a key ID, refreshing the set when it is
    /// stale or does not know the ID.
    pub async fn get_key(&self, kid: &str) -> FirebaseResult<Option<DecodingKey>> {
        if let Some(key) = self.cached_key(kid, false).await {
            return Ok(Some(key));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited
        if let Some(key) = self.cached_key(kid, false).await {
            return Ok(Some(key));
        }

        {
            let state = self.state.read().await;
            if !state.refresh_due() {
                return state.without_refresh(kid);
            }
        }

        if let Err(e) = self.refresh().await {
            record_key_refresh(false);
            if let Some(key) = self.cached_key(kid, true).await {
                warn!("Failed to refresh signing keys, using cached key: {}", e);
                return Ok(Some(key));
            }
            return Err(e);
        }
        record_key_refresh(true);

        Ok(self.cached_key(kid, true).await)
    }

    /// Number of keys currently cached.
    pub async fn len(&self) -> usize {
        self.state.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn cached_key(&self, kid: &str, allow_stale: bool) -> Option<DecodingKey> {
        let state = self.state.read().await;
        if !allow_stale && state.is_stale() {
            return None;
        }
        state.keys.get(kid).cloned()
    }

    async fn refresh(&self) -> FirebaseResult<()> {
        let fetched = self.fetch().await;

        let mut state = self.state.write().await;
        state.attempted_at = Some(Instant::now());
        match fetched {
            Ok(keys) => {
                debug!("Refreshed {} signing keys", keys.len());
                state.keys = keys;
                state.refreshed_at = state.attempted_at;
                state.last_failure = None;
                Ok(())
            }
            Err(e) => {
                state.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> FirebaseResult<HashMap<String, DecodingKey>> {
        debug!(url = %self.url, "Refreshing signing keys");

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirebaseError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", self.url, body),
            ));
        }

        let jwks: JwksResponse = response.json().await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => warn!(kid = %jwk.kid, "Skipping unusable signing key: {}", e),
            }
        }

        if keys.is_empty() {
            return Err(FirebaseError::InvalidResponse(format!(
                "{} returned no usable keys",
                self.url
            )));
        }

        Ok(keys)
    }
}
