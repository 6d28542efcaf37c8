//! Currency registry interface consumed by the rate core.

use async_trait::async_trait;
use exrate_common::{Currency, CurrencyCode};

use crate::error::StoreError;

/// Read access to the set of registered currencies.
///
/// The registry itself (creation, listing endpoints) lives outside the rate
/// core; the core only resolves codes and enumerates currencies through this
/// trait.
#[async_trait]
pub trait CurrencyRegistry: Send + Sync {
    /// List every registered currency.
    async fn list_all(&self) -> Result<Vec<Currency>, StoreError>;

    /// Look up a currency by code.
    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError>;
}

/// In-memory registry for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MemoryCurrencyRegistry {
    currencies: parking_lot::RwLock<std::collections::BTreeMap<CurrencyCode, Currency>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryCurrencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            currencies: parking_lot::RwLock::new(std::collections::BTreeMap::new()),
        }
    }

    /// Register a currency.
    pub fn register(&self, currency: Currency) {
        self.currencies
            .write()
            .insert(currency.code.clone(), currency);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MemoryCurrencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl CurrencyRegistry for MemoryCurrencyRegistry {
    async fn list_all(&self) -> Result<Vec<Currency>, StoreError> {
        Ok(self.currencies.read().values().cloned().collect())
    }

    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError> {
        Ok(self.currencies.read().get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_memory_registry() {
        let registry = MemoryCurrencyRegistry::new();
        registry.register(Currency::new(code("USD"), "US Dollar"));
        registry.register(Currency::new(code("EUR"), "Euro"));

        let all = registry.list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let usd = registry.get_by_code(&code("USD")).await.unwrap().unwrap();
        assert_eq!(usd.name, "US Dollar");

        assert!(registry.get_by_code(&code("XYZ")).await.unwrap().is_none());
    }
}
