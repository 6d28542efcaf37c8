//! Error types for the rate core.

use std::time::Duration;

use exrate_common::CurrencyCode;
use thiserror::Error;

/// Errors produced by a remote rate fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned status {0}")]
    Status(u16),

    /// The provider answered with a body we could not use.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The call exceeded its deadline.
    #[error("fetch timed out after {0:?}")]
    TimedOut(Duration),
}

/// Errors produced by the currency registry and the rate history store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A currency with this code is already registered.
    #[error("currency {0} already registered")]
    DuplicateCurrency(CurrencyCode),
}

impl StoreError {
    /// Wrap a backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Errors surfaced by rate lookups.
///
/// An unregistered code fails distinctly ([`RateError::InvalidCurrency`])
/// from a registered pair with no available data
/// ([`RateError::NotFoundAfterRefresh`]), so callers can tell bad input
/// from "no data yet".
#[derive(Debug, Error)]
pub enum RateError {
    /// The code does not resolve to a registered currency.
    #[error("currency not registered: {0}")]
    InvalidCurrency(CurrencyCode),

    /// The remote fetch for the base currency failed.
    #[error("failed to fetch rates for {base}")]
    FetchFailed {
        base: CurrencyCode,
        #[source]
        source: FetchError,
    },

    /// No rate for the pair, even after a fresh fetch attempt.
    #[error("no rate from {base} to {target} available after refresh")]
    NotFoundAfterRefresh {
        base: CurrencyCode,
        target: CurrencyCode,
    },

    /// The currency registry could not be consulted.
    #[error("currency registry lookup failed")]
    Registry(#[source] StoreError),
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;
