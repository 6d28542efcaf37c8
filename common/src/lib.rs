//! Exrate Common Types
//!
//! This crate contains the shared domain types of the exchange-rate service:
//! validated currency codes, registered currencies, persisted rate
//! observations, and timestamp helpers.

pub mod currency;
pub mod rate;
pub mod time;

pub use currency::*;
pub use rate::*;
pub use time::*;
