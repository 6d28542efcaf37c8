//! Exrate Service
//!
//! Wires the rate core to its PostgreSQL store and Open Exchange Rates
//! provider, and drives the scheduled refresh loop.

pub mod config;

pub use config::ServiceConfig;
