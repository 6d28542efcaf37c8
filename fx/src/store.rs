//! Rate history store interface.

use async_trait::async_trait;
use exrate_common::{CurrencyCode, RateObservation};

use crate::error::StoreError;

/// Durable, append-only history of rate observations.
///
/// The core never updates or deletes history; it reads the latest
/// observation per pair and appends batches of new ones.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Most recent observation for `(base, target)`, by `observed_at`.
    async fn find_latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Option<RateObservation>, StoreError>;

    /// Append a batch of observations.
    async fn save_all(&self, observations: Vec<RateObservation>) -> Result<(), StoreError>;
}

/// In-memory store for testing, with save-failure injection.
#[cfg(any(test, feature = "test-utils"))]
pub struct MemoryRateStore {
    rows: parking_lot::RwLock<Vec<RateObservation>>,
    fail_saves: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryRateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rows: parking_lot::RwLock::new(Vec::new()),
            fail_saves: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Seed an observation directly.
    pub fn insert(&self, observation: RateObservation) {
        self.rows.write().push(observation);
    }

    /// Make subsequent `save_all` calls fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Total stored observations.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Number of stored observations for one pair.
    pub fn count_for(&self, base: &CurrencyCode, target: &CurrencyCode) -> usize {
        self.rows
            .read()
            .iter()
            .filter(|row| &row.base == base && &row.target == target)
            .count()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateStore for MemoryRateStore {
    async fn find_latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Option<RateObservation>, StoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| &row.base == base && &row.target == target)
            .max_by_key(|row| row.observed_at)
            .cloned())
    }

    async fn save_all(&self, observations: Vec<RateObservation>) -> Result<(), StoreError> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::backend("save_all failure injected"));
        }
        self.rows.write().extend(observations);
        Ok(())
    }
}
