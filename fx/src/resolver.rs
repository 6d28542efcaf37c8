//! Rate lookup with cache/store/remote-fetch fallback.

use std::sync::Arc;

use exrate_common::{Currency, CurrencyCode, RateObservation};
use tracing::{debug, instrument};

use crate::cache::RateCache;
use crate::error::{RateError, RateResult};
use crate::refresh::RateRefresher;
use crate::registry::CurrencyRegistry;

/// Answers "what is the rate from A to B".
///
/// Lookup order: in-memory cache first; on a miss, one synchronous
/// single-currency refresh for the base (which consults the history store
/// and the remote provider and repopulates the cache), then one cache
/// re-check. The refresh is awaited directly, so the re-check happens
/// strictly after fetch completion.
pub struct RateResolver {
    registry: Arc<dyn CurrencyRegistry>,
    refresher: Arc<RateRefresher>,
    cache: Arc<RateCache>,
}

impl RateResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(
        registry: Arc<dyn CurrencyRegistry>,
        refresher: Arc<RateRefresher>,
        cache: Arc<RateCache>,
    ) -> Self {
        Self {
            registry,
            refresher,
            cache,
        }
    }

    /// Look up the latest known rate from `base` to `target`.
    ///
    /// The returned observation's `observed_at` is the timestamp of the
    /// latest persisted observation backing the value, not the read time.
    #[instrument(skip(self), fields(base = %base, target = %target))]
    pub async fn get_rate(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> RateResult<RateObservation> {
        let base_currency = self.resolve(base).await?;
        self.resolve(target).await?;

        if let Some(hit) = self.cache.get(base, target) {
            return Ok(RateObservation::observed(
                base.clone(),
                target.clone(),
                hit.value,
                hit.observed_at,
            ));
        }

        debug!("cache miss; refreshing base currency");
        self.refresher.refresh_currency(&base_currency).await?;

        match self.cache.get(base, target) {
            Some(hit) => Ok(RateObservation::observed(
                base.clone(),
                target.clone(),
                hit.value,
                hit.observed_at,
            )),
            None => Err(RateError::NotFoundAfterRefresh {
                base: base.clone(),
                target: target.clone(),
            }),
        }
    }

    async fn resolve(&self, code: &CurrencyCode) -> RateResult<Currency> {
        match self.registry.get_by_code(code).await {
            Ok(Some(currency)) => Ok(currency),
            Ok(None) => Err(RateError::InvalidCurrency(code.clone())),
            Err(error) => Err(RateError::Registry(error)),
        }
    }
}
