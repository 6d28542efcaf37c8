//! Remote rate fetcher interface.

use std::collections::HashMap;

use async_trait::async_trait;
use exrate_common::{CurrencyCode, Timestamp};
use rust_decimal::Decimal;

use crate::error::FetchError;

/// The full rate table for one base currency, as observed by the remote
/// provider at a point in time.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    /// Base currency the rates are quoted from.
    pub base: CurrencyCode,
    /// Target code -> rate value. May contain the base itself and codes
    /// unknown to the registry; reconciliation filters those out.
    pub rates: HashMap<CurrencyCode, Decimal>,
    /// When the provider observed these rates.
    pub fetched_at: Timestamp,
}

/// A remote source of exchange rates.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Fetch the full set of target rates for `base`.
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, FetchError>;
}

/// Scripted fetcher for testing.
///
/// Counts calls per base (for no-network-call assertions), and supports
/// failure injection and an artificial response delay.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFetcher {
    tables: dashmap::DashMap<CurrencyCode, HashMap<CurrencyCode, Decimal>>,
    failing: dashmap::DashMap<CurrencyCode, String>,
    calls: dashmap::DashMap<CurrencyCode, usize>,
    delay: parking_lot::Mutex<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateFetcher {
    /// Create a fetcher with no scripted rates.
    pub fn new() -> Self {
        Self {
            tables: dashmap::DashMap::new(),
            failing: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
            delay: parking_lot::Mutex::new(None),
        }
    }

    /// Script the rate table returned for `base`.
    pub fn set_rates(&self, base: CurrencyCode, rates: HashMap<CurrencyCode, Decimal>) {
        self.tables.insert(base, rates);
    }

    /// Make fetches for `base` fail with a transport error.
    pub fn fail_for(&self, base: CurrencyCode, message: impl Into<String>) {
        self.failing.insert(base, message.into());
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of fetches issued for `base`.
    pub fn calls_for(&self, base: &CurrencyCode) -> usize {
        self.calls.get(base).map(|count| *count).unwrap_or(0)
    }

    /// Total number of fetches issued.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockRateFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFetcher for MockRateFetcher {
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, FetchError> {
        *self.calls.entry(base.clone()).or_insert(0) += 1;

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failing.get(base) {
            return Err(FetchError::Transport(message.clone()));
        }

        let rates = self
            .tables
            .get(base)
            .map(|table| table.clone())
            .unwrap_or_default();

        Ok(RateSnapshot {
            base: base.clone(),
            rates,
            fetched_at: exrate_common::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_mock_fetcher_scripted_rates() {
        let fetcher = MockRateFetcher::new();
        fetcher.set_rates(
            code("USD"),
            HashMap::from([(code("EUR"), dec!(0.85))]),
        );

        let snapshot = fetcher.fetch_rates(&code("USD")).await.unwrap();
        assert_eq!(snapshot.rates[&code("EUR")], dec!(0.85));
        assert_eq!(fetcher.calls_for(&code("USD")), 1);
        assert_eq!(fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_fetcher_failure_injection() {
        let fetcher = MockRateFetcher::new();
        fetcher.fail_for(code("USD"), "connection refused");

        let result = fetcher.fetch_rates(&code("USD")).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert_eq!(fetcher.calls_for(&code("USD")), 1);
    }
}
