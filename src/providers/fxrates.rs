use super::normalize::parse_currency_table;
use super::util::{endpoint, http_client};
use crate::core::{CurrencyRateSource, FetchError};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const SOURCE_NAME: &str = "fxratesapi";

/// USD based exchange rate table from fxratesapi.com.
pub struct FxRatesProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl FxRatesProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(FxRatesProvider {
            base_url: base_url.to_string(),
            api_key,
            // The deadline is enforced around the whole exchange in `fetch_rates`.
            client: http_client(None)?,
            timeout,
        })
    }

    fn url(&self) -> Result<reqwest::Url, FetchError> {
        let base = endpoint(&self.base_url, "latest");
        let url = match &self.api_key {
            Some(key) => reqwest::Url::parse_with_params(&base, &[("api_key", key)]),
            None => reqwest::Url::parse(&base),
        };
        url.map_err(|e| FetchError::Network(format!("Invalid rate table URL {base}: {e}")))
    }

    async fn request(&self) -> Result<BTreeMap<String, f64>, FetchError> {
        let url = self.url()?;
        debug!("Requesting rate table from {}", url.path());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {} for rate table",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        parse_currency_table(&payload).ok_or_else(|| {
            FetchError::MalformedPayload("Rate table has no usable rates".to_string())
        })
    }
}

#[async_trait]
impl CurrencyRateSource for FxRatesProvider {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "FxRatesTableFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<BTreeMap<String, f64>, FetchError> {
        // Dropping the request future on expiry cancels the in-flight exchange.
        match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => {
                if let Ok(rates) = &result {
                    debug!(count = rates.len(), "Received rate table");
                }
                result
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Rate table request cancelled");
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}
