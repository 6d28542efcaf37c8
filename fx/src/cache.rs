//! In-process rate cache.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use exrate_common::{CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use tracing::debug;

/// A cached rate value together with the time it was observed.
///
/// The timestamp is carried alongside the value so lookups can report a real
/// `as_of` instead of the read time: it matches the latest persisted
/// observation backing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRate {
    pub value: Decimal,
    pub observed_at: Timestamp,
}

/// Per-base table of cached target rates.
pub type RateTable = HashMap<CurrencyCode, CachedRate>;

/// Thread-safe cache of the most recently fetched rate table per base
/// currency.
///
/// Entries live for the process lifetime; there is no TTL or eviction.
/// Staleness is bounded only by the refresh interval and the on-demand
/// refresh a cache miss triggers. Each per-base table is replaced wholesale:
/// readers observe either the old table or the new one in full, never a
/// partially-updated mix.
pub struct RateCache {
    tables: DashMap<CurrencyCode, Arc<RateTable>>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Look up the cached rate from `base` to `target`.
    pub fn get(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<CachedRate> {
        let hit = self
            .tables
            .get(base)
            .and_then(|table| table.get(target).copied());

        match hit {
            Some(rate) => {
                debug!(base = %base, target = %target, "cache hit");
                Some(rate)
            }
            None => {
                debug!(base = %base, target = %target, "cache miss");
                None
            }
        }
    }

    /// Atomically replace the whole rate table for `base`.
    pub fn replace_table(&self, base: CurrencyCode, table: RateTable) {
        self.tables.insert(base, Arc::new(table));
    }

    /// Number of base currencies with a cached table.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Drop all cached tables.
    pub fn clear(&self) {
        self.tables.clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let bases = self.tables.len();
        let pairs = self.tables.iter().map(|entry| entry.value().len()).sum();

        CacheStats { bases, pairs }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub bases: usize,
    pub pairs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use exrate_common::now;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn table(rates: &[(&str, Decimal)]) -> RateTable {
        rates
            .iter()
            .map(|(target, value)| {
                (
                    code(target),
                    CachedRate {
                        value: *value,
                        observed_at: now(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_replace_and_get() {
        let cache = RateCache::new();
        cache.replace_table(code("USD"), table(&[("EUR", dec!(0.85))]));

        let hit = cache.get(&code("USD"), &code("EUR")).unwrap();
        assert_eq!(hit.value, dec!(0.85));
    }

    #[test]
    fn test_miss() {
        let cache = RateCache::new();
        assert!(cache.get(&code("USD"), &code("EUR")).is_none());

        cache.replace_table(code("USD"), table(&[("EUR", dec!(0.85))]));
        assert!(cache.get(&code("USD"), &code("GBP")).is_none());
        assert!(cache.get(&code("EUR"), &code("USD")).is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = RateCache::new();
        cache.replace_table(
            code("USD"),
            table(&[("EUR", dec!(0.85)), ("GBP", dec!(0.79))]),
        );
        cache.replace_table(code("USD"), table(&[("JPY", dec!(151.2))]));

        // The old table is gone in full, not merged.
        assert!(cache.get(&code("USD"), &code("EUR")).is_none());
        assert!(cache.get(&code("USD"), &code("GBP")).is_none());
        assert_eq!(
            cache.get(&code("USD"), &code("JPY")).unwrap().value,
            dec!(151.2)
        );
    }

    #[test]
    fn test_stats() {
        let cache = RateCache::new();
        assert_eq!(cache.stats(), CacheStats { bases: 0, pairs: 0 });

        cache.replace_table(
            code("USD"),
            table(&[("EUR", dec!(0.85)), ("GBP", dec!(0.79))]),
        );
        cache.replace_table(code("EUR"), table(&[("USD", dec!(1.17))]));

        assert_eq!(cache.stats(), CacheStats { bases: 2, pairs: 3 });
    }
}
