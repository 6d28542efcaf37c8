//! Exrate FX Core
//!
//! Exchange-rate freshness and retrieval: the scheduled multi-currency
//! refresh job, the in-process rate cache, and the cache/store/remote-fetch
//! fallback chain used to answer rate lookups.
//!
//! # Components
//!
//! - [`RateCache`] — per-base rate tables, replaced wholesale on refresh
//! - [`RateRefresher`] — fetch + reconcile + cache + persist for one base
//! - [`RefreshScheduler`] — fixed-interval cycle over all registered currencies
//! - [`RateResolver`] — cache-first lookup with synchronous refresh on miss
//!
//! Collaborators (currency registry, remote fetcher, rate history store) are
//! consumed through traits and injected at construction time.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use exrate_fx::{RateCache, RateRefresher, RateResolver, RefreshConfig};
//!
//! let cache = Arc::new(RateCache::new());
//! let refresher = Arc::new(RateRefresher::new(
//!     registry.clone(), fetcher, store, cache.clone(), RefreshConfig::default(),
//! ));
//! let resolver = RateResolver::new(registry, refresher, cache);
//!
//! let rate = resolver.get_rate(&usd, &eur).await?;
//! ```

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod refresh;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod store;

pub use cache::{CacheStats, CachedRate, RateCache, RateTable};
pub use error::{FetchError, RateError, RateResult, StoreError};
pub use fetcher::{RateFetcher, RateSnapshot};
pub use refresh::{RateRefresher, RefreshConfig, RefreshOutcome};
pub use registry::CurrencyRegistry;
pub use resolver::RateResolver;
pub use scheduler::{CycleOutcome, RefreshScheduler, SchedulerConfig};
pub use store::RateStore;
