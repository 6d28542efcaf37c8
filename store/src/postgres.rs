//! PostgreSQL registry and rate history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};

use exrate_common::{Currency, CurrencyCode, RateObservation};
use exrate_fx::{CurrencyRegistry, RateStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct CurrencyRow {
    code: String,
    name: String,
}

impl CurrencyRow {
    fn into_currency(self) -> Result<Currency, StoreError> {
        let code = CurrencyCode::parse(self.code.trim()).map_err(StoreError::backend)?;
        Ok(Currency::new(code, self.name))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RateRow {
    base_code: String,
    target_code: String,
    rate: Decimal,
    observed_at: DateTime<Utc>,
}

impl RateRow {
    fn into_observation(self) -> Result<RateObservation, StoreError> {
        let base = CurrencyCode::parse(self.base_code.trim()).map_err(StoreError::backend)?;
        let target = CurrencyCode::parse(self.target_code.trim()).map_err(StoreError::backend)?;
        Ok(RateObservation::observed(
            base,
            target,
            self.rate,
            self.observed_at,
        ))
    }
}

/// Currency registry over a `currency` table.
pub struct PgCurrencyRegistry {
    pool: PgPool,
}

impl PgCurrencyRegistry {
    /// Create a registry over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new currency. Rejects duplicates.
    pub async fn add_currency(
        &self,
        code: CurrencyCode,
        name: impl Into<String>,
    ) -> Result<Currency, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM currency WHERE code = $1)")
                .bind(code.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        if exists {
            return Err(StoreError::DuplicateCurrency(code));
        }

        let currency = Currency::new(code, name);
        sqlx::query("INSERT INTO currency (code, name) VALUES ($1, $2)")
            .bind(currency.code.as_str())
            .bind(&currency.name)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        info!(code = %currency.code, "currency registered");
        Ok(currency)
    }
}

#[async_trait]
impl CurrencyRegistry for PgCurrencyRegistry {
    async fn list_all(&self) -> Result<Vec<Currency>, StoreError> {
        let rows: Vec<CurrencyRow> =
            sqlx::query_as("SELECT code, name FROM currency ORDER BY code")
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        rows.into_iter().map(CurrencyRow::into_currency).collect()
    }

    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError> {
        let row: Option<CurrencyRow> =
            sqlx::query_as("SELECT code, name FROM currency WHERE code = $1")
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        row.map(CurrencyRow::into_currency).transpose()
    }
}

/// Append-only rate history over an `exchange_rate` table.
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn find_latest(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Option<RateObservation>, StoreError> {
        let row: Option<RateRow> = sqlx::query_as(
            "SELECT base_code, target_code, rate, observed_at \
             FROM exchange_rate \
             WHERE base_code = $1 AND target_code = $2 \
             ORDER BY observed_at DESC \
             LIMIT 1",
        )
        .bind(base.as_str())
        .bind(target.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(RateRow::into_observation).transpose()
    }

    async fn save_all(&self, observations: Vec<RateObservation>) -> Result<(), StoreError> {
        if observations.is_empty() {
            return Ok(());
        }

        let count = observations.len();
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        for observation in observations {
            sqlx::query(
                "INSERT INTO exchange_rate (base_code, target_code, rate, observed_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(observation.base.as_str())
            .bind(observation.target.as_str())
            .bind(observation.value)
            .bind(observation.observed_at)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;
        }
        tx.commit().await.map_err(StoreError::backend)?;

        debug!(count, "rate observations persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exrate_common::now;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_row_conversion() {
        let row = CurrencyRow {
            code: "USD".to_string(),
            name: "US Dollar".to_string(),
        };
        let currency = row.into_currency().unwrap();
        assert_eq!(currency.code.as_str(), "USD");

        let bad = CurrencyRow {
            code: "us".to_string(),
            name: "broken".to_string(),
        };
        assert!(bad.into_currency().is_err());
    }

    #[test]
    fn test_rate_row_conversion_trims_char_padding() {
        // CHAR(3) columns come back space-padded on some drivers.
        let observed_at = now();
        let row = RateRow {
            base_code: "USD".to_string(),
            target_code: "EUR".to_string(),
            rate: dec!(0.85),
            observed_at,
        };
        let observation = row.into_observation().unwrap();
        assert_eq!(observation.base.as_str(), "USD");
        assert_eq!(observation.target.as_str(), "EUR");
        assert_eq!(observation.value, dec!(0.85));
        assert_eq!(observation.observed_at, observed_at);
    }
}
