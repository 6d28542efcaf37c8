//! Open Exchange Rates HTTP client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use exrate_common::{from_unix_seconds, now, CurrencyCode};
use exrate_fx::{FetchError, RateFetcher, RateSnapshot};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// Provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base URL.
    pub base_url: String,
    /// App id, sent both as the `Authorization: Token` header and the
    /// `app_id` query parameter.
    pub api_key: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openexchangerates.org/api".to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Wire format of the provider's latest-rates endpoint.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    timestamp: Option<i64>,
    rates: HashMap<String, Decimal>,
}

/// HTTP client for the Open Exchange Rates latest-rates endpoint.
pub struct OpenExchangeRatesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenExchangeRatesClient {
    /// Build a client from connection settings.
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Token {}", config.api_key))
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl RateFetcher for OpenExchangeRatesClient {
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot, FetchError> {
        let url = format!("{}/latest.json", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("app_id", self.api_key.as_str()), ("base", base.as_str())])
            .send()
            .await
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let payload: LatestRatesResponse = response
            .json()
            .await
            .map_err(|error| FetchError::Malformed(error.to_string()))?;

        Ok(snapshot_from(base.clone(), payload))
    }
}

fn snapshot_from(base: CurrencyCode, payload: LatestRatesResponse) -> RateSnapshot {
    let mut rates = HashMap::with_capacity(payload.rates.len());
    for (key, value) in payload.rates {
        match CurrencyCode::parse(key) {
            Ok(code) => {
                rates.insert(code, value);
            }
            Err(error) => debug!(error = %error, "dropping malformed rate key"),
        }
    }

    let fetched_at = payload
        .timestamp
        .and_then(from_unix_seconds)
        .unwrap_or_else(now);

    RateSnapshot {
        base,
        rates,
        fetched_at,
    }
}
