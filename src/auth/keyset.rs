use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::error::KeySetError;

/// Where signing keys come from
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches the JWK set from the identity provider's certs endpoint
pub struct HttpKeySetSource {
    url: Url,
    http: reqwest::Client,
}

impl HttpKeySetSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeySetError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, http })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let response = self.http.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        let keys: JwkSet = serde_json::from_slice(&body)?;
        Ok(keys)
    }
}

/// One immutable generation of fetched keys
#[derive(Debug)]
pub struct CachedKeySet {
    pub keys: JwkSet,
    pub fetched_at: Instant,
}

/// Read-mostly cache over a [`KeySetSource`].
///
/// Readers clone the current `Arc` snapshot and verify against it without
/// holding any lock. Refreshes are single-flight and swap in a new snapshot.
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    refresh_interval: Duration,
    fetch_timeout: Duration,
    current: RwLock<Option<Arc<CachedKeySet>>>,
    refresh: Mutex<()>,
    // bumped on every failed fetch so queued cold-start callers share the outcome
    failures: AtomicU64,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            refresh_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(5),
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            failures: AtomicU64::new(0),
        }
    }

    /// Minimum spacing between forced refreshes
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Current snapshot, fetching on first use and after the TTL lapses
    pub async fn get(&self) -> Result<Arc<CachedKeySet>, KeySetError> {
        let snapshot = self.current.read().await.clone();

        match snapshot {
            Some(cached) if cached.fetched_at.elapsed() < self.ttl => Ok(cached),
            Some(stale) => {
                // someone else is already refreshing; keep serving what we have
                let Ok(_guard) = self.refresh.try_lock() else {
                    return Ok(stale);
                };
                if let Some(newer) = self.newer_than(&stale).await {
                    return Ok(newer);
                }
                match self.fetch_and_store().await {
                    Ok(fresh) => Ok(fresh),
                    Err(e) => {
                        warn!("Key set refresh failed, serving stale keys: {}", e);
                        Ok(stale)
                    }
                }
            }
            None => {
                let failures_seen = self.failures.load(Ordering::Acquire);
                let _guard = self.refresh.lock().await;
                if let Some(cached) = self.current.read().await.clone() {
                    return Ok(cached);
                }
                if self.failures.load(Ordering::Acquire) != failures_seen {
                    return Err(KeySetError::Unavailable);
                }
                self.fetch_and_store().await
            }
        }
    }

    /// Refetch because `seen` lacked a key the caller needed.
    ///
    /// Returns `seen` unchanged when it is younger than the refresh interval.
    pub async fn force_refresh(&self, seen: &Arc<CachedKeySet>) -> Result<Arc<CachedKeySet>, KeySetError> {
        if seen.fetched_at.elapsed() < self.refresh_interval {
            debug!("Skipping forced key set refresh, last fetch {:?} ago", seen.fetched_at.elapsed());
            return Ok(seen.clone());
        }

        let _guard = self.refresh.lock().await;
        if let Some(newer) = self.newer_than(seen).await {
            return Ok(newer);
        }
        self.fetch_and_store().await
    }

    async fn newer_than(&self, seen: &Arc<CachedKeySet>) -> Option<Arc<CachedKeySet>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|current| !Arc::ptr_eq(current, seen))
            .cloned()
    }

    async fn fetch_and_store(&self) -> Result<Arc<CachedKeySet>, KeySetError> {
        let keys = match self.fetch_bounded().await {
            Ok(keys) => keys,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::AcqRel);
                return Err(e);
            }
        };

        info!("Fetched signing key set with {} keys", keys.keys.len());
        let fresh = Arc::new(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
        });
        *self.current.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch_bounded(&self) -> Result<JwkSet, KeySetError> {
        let keys = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .map_err(|_| KeySetError::Timeout(self.fetch_timeout))??;

        if keys.keys.is_empty() {
            return Err(KeySetError::Empty);
        }
        Ok(keys)
    }
}
