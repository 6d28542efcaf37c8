//! Schema migrations, applied idempotently at startup.

use sqlx::PgPool;

use exrate_fx::StoreError;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_currency_and_rates",
    sql: r#"
CREATE TABLE IF NOT EXISTS currency (
    code CHAR(3) PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS exchange_rate (
    id BIGSERIAL PRIMARY KEY,
    base_code CHAR(3) NOT NULL REFERENCES currency (code),
    target_code CHAR(3) NOT NULL REFERENCES currency (code),
    rate NUMERIC(20, 6) NOT NULL,
    observed_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_exchange_rate_pair_observed
    ON exchange_rate (base_code, target_code, observed_at DESC);
"#,
}];

/// Apply all migrations in order.
pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
    for migration in MIGRATIONS {
        tracing::debug!(version = migration.version, "applying migration");
        sqlx::raw_sql(migration.sql)
            .execute(pool)
            .await
            .map_err(StoreError::backend)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_versioned_in_order() {
        let mut versions: Vec<_> = MIGRATIONS.iter().map(|m| m.version).collect();
        versions.dedup();
        assert_eq!(versions.len(), MIGRATIONS.len());
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
