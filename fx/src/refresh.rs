//! Single-currency refresh and reconciliation.

use std::sync::Arc;
use std::time::Duration;

use exrate_common::{Currency, RateObservation};
use tracing::{debug, info, warn};

use crate::cache::{CachedRate, RateCache, RateTable};
use crate::error::{FetchError, RateError};
use crate::fetcher::RateFetcher;
use crate::registry::CurrencyRegistry;
use crate::store::RateStore;

/// Refresh execution configuration.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Deadline for a single remote fetch call. Bounds how long a stalled
    /// provider can hold up one currency's refresh or one lookup.
    pub fetch_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of refreshing one base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOutcome {
    /// Pairs written to the cache table.
    pub cached: usize,
    /// Newly persisted observations.
    pub persisted: usize,
    /// Whether the history write failed. The cache is updated regardless.
    pub persist_failed: bool,
}

/// Fetches, reconciles, caches, and persists rates for one base currency.
///
/// Shared by the scheduler (one call per registered currency per cycle) and
/// the resolver (one synchronous call on cache miss). Reconciliation drops
/// self-rates and targets unknown to the registry, and skips re-persisting
/// values numerically equal to the latest stored observation so unchanged
/// rates do not grow the history.
pub struct RateRefresher {
    registry: Arc<dyn CurrencyRegistry>,
    fetcher: Arc<dyn RateFetcher>,
    store: Arc<dyn RateStore>,
    cache: Arc<RateCache>,
    config: RefreshConfig,
}

impl RateRefresher {
    /// Create a refresher over the given collaborators.
    pub fn new(
        registry: Arc<dyn CurrencyRegistry>,
        fetcher: Arc<dyn RateFetcher>,
        store: Arc<dyn RateStore>,
        cache: Arc<RateCache>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            cache,
            config,
        }
    }

    /// Refresh the full rate table for `base`.
    ///
    /// On success the cache table for `base` is replaced wholesale with the
    /// reconciled result and newly observed values are appended to the
    /// history in one batch. A history write failure is reported in the
    /// outcome but does not roll back the cache: the cache reflects the
    /// fetch, not the persistence result. An empty reconciled table leaves
    /// the cache untouched.
    pub async fn refresh_currency(&self, base: &Currency) -> Result<RefreshOutcome, RateError> {
        let fetch = self.fetcher.fetch_rates(&base.code);
        let snapshot = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(source)) => {
                return Err(RateError::FetchFailed {
                    base: base.code.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(RateError::FetchFailed {
                    base: base.code.clone(),
                    source: FetchError::TimedOut(self.config.fetch_timeout),
                })
            }
        };

        debug!(
            base = %base.code,
            pairs = snapshot.rates.len(),
            fetched_at = %snapshot.fetched_at,
            "fetched rate snapshot"
        );

        let mut table = RateTable::new();
        let mut fresh = Vec::new();

        for (target, value) in snapshot.rates {
            // No self-rate.
            if target == base.code {
                continue;
            }

            match self.registry.get_by_code(&target).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(base = %base.code, target = %target, "target not registered; dropping pair");
                    continue;
                }
                Err(error) => {
                    warn!(
                        base = %base.code,
                        target = %target,
                        error = %error,
                        "registry lookup failed; dropping pair"
                    );
                    continue;
                }
            }

            let previous = match self.store.find_latest(&base.code, &target).await {
                Ok(previous) => previous,
                Err(error) => {
                    warn!(
                        base = %base.code,
                        target = %target,
                        error = %error,
                        "history lookup failed; treating pair as changed"
                    );
                    None
                }
            };

            match previous {
                Some(previous) if previous.value == value => {
                    // Unchanged: cache it under the still-latest persisted
                    // observation's timestamp, persist nothing.
                    table.insert(
                        target,
                        CachedRate {
                            value,
                            observed_at: previous.observed_at,
                        },
                    );
                }
                _ => {
                    let observation =
                        RateObservation::new(base.code.clone(), target.clone(), value);
                    table.insert(
                        target,
                        CachedRate {
                            value,
                            observed_at: observation.observed_at,
                        },
                    );
                    fresh.push(observation);
                }
            }
        }

        if table.is_empty() {
            warn!(base = %base.code, "no usable rates in snapshot; cache left untouched");
            return Ok(RefreshOutcome::default());
        }

        let cached = table.len();
        self.cache.replace_table(base.code.clone(), table);

        let mut persisted = 0;
        let mut persist_failed = false;
        if !fresh.is_empty() {
            let batch = fresh.len();
            match self.store.save_all(fresh).await {
                Ok(()) => persisted = batch,
                Err(error) => {
                    warn!(base = %base.code, error = %error, "failed to persist rate history");
                    persist_failed = true;
                }
            }
        }

        info!(base = %base.code, cached, persisted, "rate table refreshed");

        Ok(RefreshOutcome {
            cached,
            persisted,
            persist_failed,
        })
    }
}
