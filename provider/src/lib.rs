//! Exrate Provider
//!
//! Remote rate fetching over the Open Exchange Rates HTTP API. This crate
//! supplies the concrete [`exrate_fx::RateFetcher`] the service wires into
//! the rate core.

pub mod client;

pub use client::{OpenExchangeRatesClient, ProviderConfig};
