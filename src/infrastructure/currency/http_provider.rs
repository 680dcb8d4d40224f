//! Open exchange-rate endpoint over HTTP

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{RateProvider, RateProviderError};

/// Response of `GET {base}/latest/USD`.
#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

pub struct HttpRateProvider {
    client: Client,
    url: String,
}

impl HttpRateProvider {
    /// `timeout` bounds the whole request. The converter applies its own
    /// deadline on top.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tutoring-billing/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_units_per_usd(&self) -> Result<HashMap<String, Decimal>, RateProviderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::warn!(url = %self.url, error = %e, "Exchange-rate request failed");
                RateProviderError::Request(e.to_string())
            })?;

        let body: LatestRates = response
            .json()
            .await
            .map_err(|e| RateProviderError::Malformed(e.to_string()))?;

        Ok(parse_rates(body.rates))
    }
}

/// Keep finite, positive entries only.
fn parse_rates(raw: HashMap<String, f64>) -> HashMap<String, Decimal> {
    raw.into_iter()
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .filter_map(|(code, v)| Decimal::from_f64(v).map(|d| (code.to_ascii_uppercase(), d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_and_drops_bad_entries() {
        let body: LatestRates = serde_json::from_str(
            r#"{"result":"success","base_code":"USD","rates":{"USD":1,"egp":48.5,"XXX":0,"YYY":-2}}"#,
        )
        .unwrap();
        let rates = parse_rates(body.rates);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates["EGP"], Decimal::new(485, 1));
        assert_eq!(rates["USD"], Decimal::ONE);
    }

    #[test]
    fn payload_without_rates_is_malformed() {
        assert!(serde_json::from_str::<LatestRates>(r#"{"result":"error"}"#).is_err());
    }
}
