use std::{
    task::{Context, Poll},
    time::Duration,
};

use futures::future::BoxFuture;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::Client;
use tower::{util::BoxCloneSyncService, Service, ServiceBuilder, ServiceExt};
use url::Url;

use crate::{jwks_cache::JwksCacheLayer, JwkSetError};

/// Upper bound for a single key set request unless configured otherwise.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// How a key set request may be answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FetchMode {
    /// A cached key set is acceptable.
    Cached,
    /// Go to the authority, replacing whatever is cached.
    Refresh,
}

struct CacheConfig {
    time_to_live: Duration,
}

/// Builder for configuring a `RemoteJwkSet` with a request timeout and optional caching.
pub struct RemoteJwkSetBuilder {
    url: Url,
    timeout: Duration,
    cache_config: Option<CacheConfig>,
}

impl RemoteJwkSetBuilder {
    /// Creates a new builder with the given JWKS URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: DEFAULT_FETCH_TIMEOUT,
            cache_config: None,
        }
    }

    /// Bounds how long a single fetch may take before it is reported as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables caching to avoid re-fetching the remote JWK set on every authentication request.
    ///
    /// Without a cache every lookup goes to the authority.
    pub fn with_cache(mut self, time_to_live: Duration) -> Self {
        self.cache_config = Some(CacheConfig { time_to_live });
        self
    }

    /// Builds the `RemoteJwkSet` with the configured options.
    pub fn build(self) -> RemoteJwkSet {
        let request_service = JwkSetRequestService {
            http_client: Client::new(),
            url: self.url,
            timeout: self.timeout,
        };

        let cached = self.cache_config.is_some();
        let cache_layer = self
            .cache_config
            .map(|cache_config| JwksCacheLayer::new(cache_config.time_to_live));

        let service_tower = ServiceBuilder::new()
            .option_layer(cache_layer)
            .service(request_service);

        RemoteJwkSet {
            service_tower: BoxCloneSyncService::new(service_tower),
            cached,
        }
    }
}

/// JWK set published by a remote signing authority.
#[derive(Clone)]
pub struct RemoteJwkSet {
    service_tower: BoxCloneSyncService<FetchMode, JwkSet, JwkSetError>,
    cached: bool,
}

impl RemoteJwkSet {
    /// Creates a builder for configuring a `RemoteJwkSet`.
    pub fn builder(url: Url) -> RemoteJwkSetBuilder {
        RemoteJwkSetBuilder::new(url)
    }

    /// Returns the current key set, served from the cache when one is configured and populated.
    pub async fn jwk_set(&mut self) -> Result<JwkSet, JwkSetError> {
        self.fetch(FetchMode::Cached).await
    }

    /// Looks up the key with the given `kid`.
    ///
    /// A cached key set that lacks `kid` is refreshed once before giving up, so rotated keys are picked up without
    /// waiting for the cache to expire.
    pub async fn find(&mut self, kid: &str) -> Result<Option<Jwk>, JwkSetError> {
        let jwk_set = self.fetch(FetchMode::Cached).await?;
        if let Some(jwk) = jwk_set.find(kid) {
            return Ok(Some(jwk.clone()));
        }
        if !self.cached {
            return Ok(None);
        }

        tracing::debug!(kid, "kid not in cached JWK set, refreshing");
        let jwk_set = self.fetch(FetchMode::Refresh).await?;
        Ok(jwk_set.find(kid).cloned())
    }

    async fn fetch(&mut self, mode: FetchMode) -> Result<JwkSet, JwkSetError> {
        self.service_tower.ready().await?.call(mode).await
    }
}

/// Helper service wrapping a `reqwest::Client` to fetch a JWK Set from a given URL.
#[derive(Clone)]
struct JwkSetRequestService {
    http_client: Client,
    url: Url,
    timeout: Duration,
}

impl Service<FetchMode> for JwkSetRequestService {
    type Response = JwkSet;
    type Error = JwkSetError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _mode: FetchMode) -> Self::Future {
        let http_client = self.http_client.clone();
        let url = self.url.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            tracing::debug!(%url, "fetching JWK set");
            let response = http_client.get(url).timeout(timeout).send().await?;

            if !response.status().is_success() {
                return Err(JwkSetError::ErrorResponse {
                    status_code: response.status(),
                });
            }

            let jwk_set: JwkSet = response.json().await?;
            Ok(jwk_set)
        })
    }
}
