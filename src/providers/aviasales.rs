//! Aviasales price source.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::model::{IataCode, Offer};
use crate::providers::{ProviderAdapter, fetch_with_retry, normalize::normalize};

const PRICES_URL: &str = "https://api.aviasales.com/v3/prices_for_dates";

/// Adapter for the Aviasales API. Same response envelope as Travelpayouts
/// but authenticates with a header token.
pub struct AviasalesAdapter {
    client: reqwest::Client,
    token: SecretString,
    currency: String,
    timeout: Duration,
    retry_backoff: Duration,
}

impl AviasalesAdapter {
    pub fn new(client: reqwest::Client, token: SecretString, config: &AppConfig) -> Self {
        Self {
            client,
            token,
            currency: config.currency.clone(),
            timeout: config.provider_timeout,
            retry_backoff: config.retry_backoff,
        }
    }

    async fn query(
        &self,
        origin: IataCode,
        destination: IataCode,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Offer>, ProviderError> {
        let request = self
            .client
            .get(PRICES_URL)
            .header("X-Access-Token", self.token.expose_secret())
            .query(&[
                ("origin", origin.to_string()),
                ("destination", destination.to_string()),
                ("departure_at", date.format("%Y-%m-%d").to_string()),
                ("currency", self.currency.clone()),
                ("sorting", "price".to_string()),
                ("one_way", "true".to_string()),
                ("limit", limit.to_string()),
            ]);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ProviderError::Timeout {
                name: "aviasales".into(),
                timeout: self.timeout,
            })?
            .map_err(|e| ProviderError::RequestFailed {
                name: "aviasales".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::BadStatus {
                name: "aviasales".into(),
                status: response.status().as_u16(),
            });
        }

        let payload: Value = response.json().await.map_err(|e| {
            ProviderError::MalformedPayload {
                name: "aviasales".into(),
                reason: e.to_string(),
            }
        })?;

        let items = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::MalformedPayload {
                name: "aviasales".into(),
                reason: "missing data array".into(),
            })?;

        Ok(items
            .iter()
            .filter_map(|item| normalize(item, origin, destination, &self.currency))
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for AviasalesAdapter {
    fn name(&self) -> &str {
        "aviasales"
    }

    async fn fetch(
        &self,
        origin: IataCode,
        destination: IataCode,
        date: NaiveDate,
        limit: usize,
    ) -> Vec<Offer> {
        fetch_with_retry(self.name(), self.retry_backoff, || {
            self.query(origin, destination, date, limit)
        })
        .await
    }
}
