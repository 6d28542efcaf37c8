//! Scheduled multi-currency refresh cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::refresh::RateRefresher;
use crate::registry::CurrencyRegistry;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between refresh cycles.
    pub interval: Duration,
    /// Maximum currencies refreshed concurrently within a cycle.
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_concurrent: 4,
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleOutcome {
    /// Currencies refreshed successfully.
    pub refreshed: usize,
    /// Currencies whose refresh failed.
    pub failed: usize,
}

/// Drives a full refresh cycle across every registered currency on a fixed
/// interval.
///
/// Re-entrancy policy: SKIP. A tick (or an on-demand [`refresh_all`] call)
/// that arrives while a cycle is still in flight is dropped and recovered at
/// the next interval, bounding resource use; cycles are independent, so a
/// skipped tick loses nothing that the next one does not redo.
///
/// [`refresh_all`]: RefreshScheduler::refresh_all
pub struct RefreshScheduler {
    registry: Arc<dyn CurrencyRegistry>,
    refresher: Arc<RateRefresher>,
    config: SchedulerConfig,
    running: AtomicBool,
}

impl RefreshScheduler {
    /// Create a scheduler over the given collaborators.
    pub fn new(
        registry: Arc<dyn CurrencyRegistry>,
        refresher: Arc<RateRefresher>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            refresher,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Run refresh cycles at the configured interval until `shutdown`
    /// signals true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh_all().await;
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("refresh scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Trigger one full refresh cycle, unless one is already in flight.
    ///
    /// Returns `None` when the cycle was skipped.
    pub async fn refresh_all(&self) -> Option<CycleOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("refresh cycle already in flight; skipping");
            return None;
        }

        let outcome = self.run_cycle().await;
        self.running.store(false, Ordering::Release);
        Some(outcome)
    }

    async fn run_cycle(&self) -> CycleOutcome {
        info!("starting refresh cycle");

        let currencies = match self.registry.list_all().await {
            Ok(currencies) => currencies,
            Err(error) => {
                error!(error = %error, "failed to list currencies; cycle abandoned");
                return CycleOutcome::default();
            }
        };

        if currencies.is_empty() {
            info!("no currencies registered; nothing to refresh");
            return CycleOutcome::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = JoinSet::new();

        for currency in currencies {
            let refresher = Arc::clone(&self.refresher);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore lives for the whole cycle and is never closed.
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let result = refresher.refresh_currency(&currency).await;
                (currency, result)
            });
        }

        let mut outcome = CycleOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => outcome.refreshed += 1,
                Ok((currency, Err(error))) => {
                    outcome.failed += 1;
                    warn!(
                        base = %currency.code,
                        error = %error,
                        "currency refresh failed; continuing cycle"
                    );
                }
                Err(error) => {
                    outcome.failed += 1;
                    error!(error = %error, "refresh task failed to complete");
                }
            }
        }

        info!(
            refreshed = outcome.refreshed,
            failed = outcome.failed,
            "refresh cycle complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RateCache;
    use crate::fetcher::MockRateFetcher;
    use crate::refresh::RefreshConfig;
    use crate::registry::MemoryCurrencyRegistry;
    use crate::store::MemoryRateStore;
    use exrate_common::{Currency, CurrencyCode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn rates(pairs: &[(&str, Decimal)]) -> HashMap<CurrencyCode, Decimal> {
        pairs
            .iter()
            .map(|(target, value)| (code(target), *value))
            .collect()
    }

    struct Harness {
        fetcher: Arc<MockRateFetcher>,
        cache: Arc<RateCache>,
        scheduler: Arc<RefreshScheduler>,
    }

    fn setup(currencies: &[&str]) -> Harness {
        let registry = Arc::new(MemoryCurrencyRegistry::new());
        for currency in currencies {
            registry.register(Currency::new(code(currency), *currency));
        }
        let fetcher = Arc::new(MockRateFetcher::new());
        let store = Arc::new(MemoryRateStore::new());
        let cache = Arc::new(RateCache::new());
        let refresher = Arc::new(RateRefresher::new(
            registry.clone(),
            fetcher.clone(),
            store,
            cache.clone(),
            RefreshConfig::default(),
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            registry,
            refresher,
            SchedulerConfig {
                interval: Duration::from_secs(60),
                max_concurrent: 2,
            },
        ));

        Harness {
            fetcher,
            cache,
            scheduler,
        }
    }

    #[tokio::test]
    async fn test_per_currency_failure_is_isolated() {
        let harness = setup(&["USD", "EUR", "GBP"]);
        harness
            .fetcher
            .set_rates(code("USD"), rates(&[("EUR", dec!(0.85))]));
        harness
            .fetcher
            .set_rates(code("EUR"), rates(&[("USD", dec!(1.17))]));
        harness.fetcher.fail_for(code("GBP"), "provider down");

        let outcome = harness.scheduler.refresh_all().await.unwrap();

        assert_eq!(outcome.refreshed, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(
            harness.cache.get(&code("USD"), &code("EUR")).unwrap().value,
            dec!(0.85)
        );
        assert_eq!(
            harness.cache.get(&code("EUR"), &code("USD")).unwrap().value,
            dec!(1.17)
        );
        assert!(harness.cache.get(&code("GBP"), &code("USD")).is_none());
    }

    #[tokio::test]
    async fn test_empty_registry_ends_cycle_quietly() {
        let harness = setup(&[]);

        let outcome = harness.scheduler.refresh_all().await.unwrap();

        assert_eq!(outcome, CycleOutcome::default());
        assert_eq!(harness.fetcher.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_cycle_is_skipped() {
        let harness = setup(&["USD", "EUR"]);
        harness
            .fetcher
            .set_rates(code("USD"), rates(&[("EUR", dec!(0.85))]));
        harness
            .fetcher
            .set_rates(code("EUR"), rates(&[("USD", dec!(1.17))]));
        harness.fetcher.set_delay(Duration::from_secs(5));

        let scheduler = Arc::clone(&harness.scheduler);
        let first = tokio::spawn(async move { scheduler.refresh_all().await });

        // Let the first cycle start and park on the delayed fetches.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(harness.scheduler.refresh_all().await.is_none());

        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.refreshed, 2);

        // The guard is released; a later cycle runs again.
        assert!(harness.scheduler.refresh_all().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let harness = setup(&["USD"]);
        harness
            .fetcher
            .set_rates(code("USD"), rates(&[("EUR", dec!(0.85))]));

        let (tx, rx) = watch::channel(false);
        let scheduler = Arc::clone(&harness.scheduler);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        // First tick fires immediately.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
