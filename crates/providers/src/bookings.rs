//! Booking provider client.
//!
//! The listing endpoint is paged through a `next` link. Date filters are sent
//! on the first request only; later pages carry their own cursor.

use std::collections::HashSet;

use async_trait::async_trait;
use booksum_core::config::BookingsConfig;
use booksum_core::domain::booking::{Booking, DEFAULT_CURRENCY};
use booksum_core::errors::BookingSourceError;
use booksum_core::summary::BookingSource;
use chrono::NaiveDate;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::http::{build_client, decimal_from_json, status_failure, trim_base_url, ClientBuildError};

const PROVIDER: &str = "booking provider";
const MAX_PAGES: usize = 10_000;

#[derive(Clone)]
pub struct HttpBookingSource {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpBookingSource {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout_secs: u64,
    ) -> Result<Self, ClientBuildError> {
        let base_url = trim_base_url(base_url);
        Url::parse(&base_url).map_err(|error| ClientBuildError::BaseUrl {
            url: base_url.clone(),
            reason: error.to_string(),
        })?;
        Ok(Self { client: build_client(timeout_secs)?, base_url, api_key })
    }

    pub fn from_config(config: &BookingsConfig) -> Result<Self, ClientBuildError> {
        Self::new(&config.base_url, config.api_key.clone(), config.timeout_secs)
    }

    async fn fetch_page(
        &self,
        url: &Url,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Value, BookingSourceError> {
        let mut request = self
            .client
            .get(url.clone())
            .header("x-api-key", self.api_key.expose_secret())
            .header("Accept", "application/json");
        if let Some((start_date, end_date)) = range {
            request = request.query(&[
                ("startTime[gte]", start_date.format("%Y-%m-%d").to_string()),
                ("startTime[lte]", end_date.format("%Y-%m-%d").to_string()),
            ]);
        }

        let response = request.send().await.map_err(|error| {
            BookingSourceError::Unavailable(format!("failed to contact {PROVIDER}: {error}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BookingSourceError::Unavailable(status_failure(PROVIDER, status, &body)));
        }

        response.json::<Value>().await.map_err(|error| {
            BookingSourceError::InvalidResponse(format!("page is not valid JSON: {error}"))
        })
    }

    fn next_page(&self, current: &Url, page: &Value) -> Result<Option<Url>, BookingSourceError> {
        let Some(next) = page.get("next").and_then(Value::as_str).map(str::trim) else {
            return Ok(None);
        };
        if next.is_empty() {
            return Ok(None);
        }
        current.join(next).map(Some).map_err(|error| {
            BookingSourceError::InvalidResponse(format!("invalid next link `{next}`: {error}"))
        })
    }
}

#[async_trait]
impl BookingSource for HttpBookingSource {
    async fn bookings_between(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingSourceError> {
        let first = Url::parse(&format!("{}/bookings", self.base_url)).map_err(|error| {
            BookingSourceError::Unavailable(format!("invalid {PROVIDER} url: {error}"))
        })?;

        let mut next_url = Some(first);
        let mut seen = HashSet::new();
        let mut bookings = Vec::new();
        let mut skipped = 0usize;
        let mut pages = 0usize;

        while let Some(url) = next_url.take() {
            if !seen.insert(url.clone()) || pages >= MAX_PAGES {
                return Err(BookingSourceError::InvalidResponse(format!(
                    "pagination did not terminate (stopped at `{url}`)"
                )));
            }

            let range = (pages == 0).then_some((start_date, end_date));
            let page = self.fetch_page(&url, range).await?;
            pages += 1;

            let records: &[Value] = match page.get("results") {
                Some(Value::Array(records)) => records.as_slice(),
                _ => &[],
            };
            debug!(
                event_name = "bookings.fetch.page",
                page = pages,
                record_count = records.len(),
                "fetched booking page"
            );

            for record in records {
                match map_record(record) {
                    Ok(Some(booking)) => bookings.push(booking),
                    Ok(None) => skipped += 1,
                    Err(reason) => {
                        skipped += 1;
                        warn!(
                            event_name = "bookings.map.skipped",
                            record = %record,
                            reason = %reason,
                            "skipping malformed booking record"
                        );
                    }
                }
            }

            next_url = self.next_page(&url, &page)?;
        }

        info!(
            event_name = "bookings.fetch.completed",
            start_date = %start_date,
            end_date = %end_date,
            pages,
            booking_count = bookings.len(),
            skipped,
            "mapped bookings from provider"
        );
        Ok(bookings)
    }
}

/// `Ok(None)` is a record without any time field, which is dropped quietly.
fn map_record(record: &Value) -> Result<Option<Booking>, String> {
    let time = ["localTime", "time"]
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|value| !value.trim().is_empty());
    let Some(time) = time else {
        return Ok(None);
    };

    let date_part = time.trim().split('T').next().unwrap_or_default();
    let check_in = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|error| format!("unparseable time `{time}`: {error}"))?;

    let id = match record.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err("missing id".to_string()),
    };

    let price = record.get("price").and_then(|price| price.get("finalRetailPrice"));
    let amount = match price.and_then(|price| price.get("amount")) {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(raw) => decimal_from_json(raw).ok_or_else(|| format!("unparseable amount `{raw}`"))?,
    };
    if amount < Decimal::ZERO {
        return Err(format!("negative amount `{amount}`"));
    }
    let currency = price
        .and_then(|price| price.get("currency"))
        .and_then(Value::as_str)
        .filter(|code| !code.trim().is_empty())
        .unwrap_or(DEFAULT_CURRENCY);

    Ok(Some(Booking::new(id, check_in, currency, amount)))
}
