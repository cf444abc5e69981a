use super::normalize::parse_quote_ask;
use super::util::{endpoint, http_client};
use crate::core::{FetchError, MetalKind, MetalQuoteSource};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

pub const SOURCE_NAME: &str = "swissquote";

/// Spot metal quotes from the Swissquote public forex feed.
pub struct SwissquoteProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SwissquoteProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(SwissquoteProvider {
            base_url: base_url.to_string(),
            client: http_client(Some(timeout))?,
            timeout,
        })
    }
}

#[async_trait]
impl MetalQuoteSource for SwissquoteProvider {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(
        name = "SwissquoteQuoteFetch",
        skip(self),
        fields(metal = %metal)
    )]
    async fn fetch_ask(&self, metal: MetalKind) -> Result<f64, FetchError> {
        let url = endpoint(
            &self.base_url,
            &format!(
                "public-quotes/bboquotes/instrument/{}/USD",
                metal.instrument()
            ),
        );
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {} for instrument: {}",
                response.status(),
                metal.instrument()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let ask = parse_quote_ask(&payload).ok_or_else(|| {
            FetchError::MalformedPayload(format!(
                "No ask price found for instrument: {}",
                metal.instrument()
            ))
        })?;
        debug!(ask, "Received quote");
        Ok(ask)
    }
}
