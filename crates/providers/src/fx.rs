use async_trait::async_trait;
use booksum_core::config::FxConfig;
use booksum_core::domain::booking::CurrencyCode;
use booksum_core::errors::FxError;
use booksum_core::summary::FxRateSource;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::http::{build_client, decimal_from_json, status_failure, trim_base_url, ClientBuildError};

const PROVIDER: &str = "FX provider";

/// `GET {base_url}/latest?base=..&currencies=..&format=json&api_key=..`
///
/// Without both a base URL and a key only identity conversions succeed.
#[derive(Clone)]
pub struct HttpFxRateSource {
    client: Client,
    endpoint: Option<(String, SecretString)>,
}

impl HttpFxRateSource {
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, ClientBuildError> {
        let base_url = base_url.map(trim_base_url).filter(|url| !url.is_empty());
        let api_key = api_key.filter(|key| !key.expose_secret().trim().is_empty());
        let endpoint = match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Some((base_url, api_key)),
            _ => None,
        };
        Ok(Self { client: build_client(timeout_secs)?, endpoint })
    }

    pub fn from_config(config: &FxConfig) -> Result<Self, ClientBuildError> {
        Self::new(config.base_url.as_deref(), config.api_key.clone(), config.timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl FxRateSource for HttpFxRateSource {
    async fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, FxError> {
        let from = CurrencyCode::new(from.as_str());
        let to = CurrencyCode::new(to.as_str());
        if from == to {
            return Ok(Decimal::ONE);
        }

        let Some((base_url, api_key)) = &self.endpoint else {
            return Err(FxError::NotConfigured { from, to });
        };

        let response = self
            .client
            .get(format!("{base_url}/latest"))
            .query(&[
                ("base", from.as_str()),
                ("currencies", to.as_str()),
                ("format", "json"),
                ("api_key", api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|error| FxError::Unavailable(format!("failed to contact {PROVIDER}: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FxError::Unavailable(status_failure(PROVIDER, status, &body)));
        }

        let payload = response.json::<Value>().await.map_err(|error| FxError::RateUnavailable {
            from: from.clone(),
            to: to.clone(),
            reason: format!("response is not valid JSON: {error}"),
        })?;

        let rate = extract_rate(&payload, &to).map_err(|reason| FxError::RateUnavailable {
            from: from.clone(),
            to: to.clone(),
            reason,
        })?;

        debug!(
            event_name = "fx.rate.fetched",
            from = %from,
            to = %to,
            rate = %rate,
            "fetched FX rate from provider"
        );
        Ok(rate)
    }
}

fn extract_rate(payload: &Value, to: &CurrencyCode) -> Result<Decimal, String> {
    if !payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
        let detail = payload
            .get("error")
            .map(Value::to_string)
            .unwrap_or_else(|| "success flag missing or false".to_string());
        return Err(format!("provider reported failure: {detail}"));
    }

    let raw = payload
        .get("rates")
        .and_then(|rates| rates.get(to.as_str()))
        .ok_or_else(|| format!("rate for {to} missing from response"))?;
    let rate = decimal_from_json(raw).ok_or_else(|| format!("rate for {to} is not numeric: {raw}"))?;

    if rate <= Decimal::ZERO {
        return Err(format!("rate for {to} is not positive: {rate}"));
    }
    Ok(rate)
}
