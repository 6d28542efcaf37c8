//! Service configuration.

use std::time::Duration;

use exrate_fx::{RefreshConfig, SchedulerConfig};
use exrate_provider::ProviderConfig;

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Database URL.
    pub database_url: String,
    /// Remote rate provider settings.
    pub provider: ProviderConfig,
    /// Refresh execution settings.
    pub refresh: RefreshConfig,
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Log level.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/exrate".to_string(),
            provider: ProviderConfig::default(),
            refresh: RefreshConfig::default(),
            scheduler: SchedulerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(url) = std::env::var("EXRATE_PROVIDER_BASE_URL") {
            config.provider.base_url = url;
        }

        if let Ok(key) = std::env::var("EXRATE_PROVIDER_API_KEY") {
            config.provider.api_key = key;
        }

        if let Ok(secs) = std::env::var("EXRATE_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.scheduler.interval = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("EXRATE_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.refresh.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(count) = std::env::var("EXRATE_MAX_CONCURRENT_REFRESHES") {
            if let Ok(count) = count.parse() {
                config.scheduler.max_concurrent = count;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.provider.base_url.is_empty() {
            return Err("Provider base URL cannot be empty".to_string());
        }

        if self.provider.api_key.is_empty() {
            return Err("Provider API key cannot be empty".to_string());
        }

        if self.scheduler.interval.is_zero() {
            return Err("Refresh interval cannot be zero".to_string());
        }

        if self.scheduler.max_concurrent == 0 {
            return Err("Max concurrent refreshes cannot be zero".to_string());
        }

        if self.refresh.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.provider.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_config_with_api_key_is_valid() {
        assert!(with_key().validate().is_ok());
    }

    #[test]
    fn test_default_config_requires_api_key() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let mut config = with_key();
        config.scheduler.interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_is_invalid() {
        let mut config = with_key();
        config.scheduler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }
}
