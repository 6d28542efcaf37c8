//! Exrate Store
//!
//! PostgreSQL-backed currency registry and append-only rate history,
//! implementing the collaborator traits the rate core consumes.

pub mod migrations;
pub mod postgres;

pub use postgres::{PgCurrencyRegistry, PgRateStore};
