use std::{
    task::{Context, Poll},
    time::Duration,
};

use futures::future::BoxFuture;
use jsonwebtoken::jwk::JwkSet;
use moka::future::Cache;
use tower::{Layer, Service};

use crate::{remote_jwk_set::FetchMode, JwkSetError};

const CACHE_KEY: &str = "jwk_set";

/// Keeps the most recently fetched key set for a bounded time.
pub(crate) struct JwksCacheLayer {
    cache: Cache<String, JwkSet>,
}

impl JwksCacheLayer {
    pub(crate) fn new(time_to_live: Duration) -> Self {
        let cache = Cache::<String, JwkSet>::builder()
            .max_capacity(1)
            .time_to_live(time_to_live)
            .build();
        JwksCacheLayer { cache }
    }
}

impl<S> Layer<S> for JwksCacheLayer {
    type Service = JwksCacheService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JwksCacheService {
            inner,
            cache: self.cache.clone(),
        }
    }
}

/// Can safely be cloned and shared across threads since moka internally uses an Arc.
#[derive(Clone)]
pub(crate) struct JwksCacheService<S> {
    inner: S,
    cache: Cache<String, JwkSet>,
}

impl<S> Service<FetchMode> for JwksCacheService<S>
where
    S: Service<FetchMode, Response = JwkSet, Error = JwkSetError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = JwkSet;
    type Error = JwkSetError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mode: FetchMode) -> Self::Future {
        // Call the instance that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let cache = self.cache.clone();
        Box::pin(async move {
            if mode == FetchMode::Cached {
                if let Some(jwk_set) = cache.get(CACHE_KEY).await {
                    tracing::debug!("serving JWK set from cache");
                    return Ok(jwk_set);
                }
            }

            let jwk_set = inner.call(mode).await?;
            cache.insert(CACHE_KEY.to_string(), jwk_set.clone()).await;
            Ok(jwk_set)
        })
    }
}
