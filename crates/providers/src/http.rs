use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid base url `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
}

/// Every provider call is bounded by `timeout_secs`; a stalled call fails.
pub fn build_client(timeout_secs: u64) -> Result<Client, ClientBuildError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("booksum/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub(crate) fn trim_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

pub(crate) fn status_failure(provider: &str, status: StatusCode, body: &str) -> String {
    let snippet: String = body.chars().take(200).collect();
    if snippet.is_empty() {
        format!("{provider} returned error status {}", status.as_u16())
    } else {
        format!("{provider} returned error status {}: {snippet}", status.as_u16())
    }
}

/// Reads a JSON number or numeric string without going through `f64`.
pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw).ok().or_else(|| Decimal::from_scientific(&raw).ok())
}
