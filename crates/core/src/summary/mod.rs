pub mod source;

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::domain::booking::CurrencyCode;
use crate::domain::query::QueryFilters;
use crate::domain::summary::BookingSummary;
use crate::errors::QueryError;
use crate::money::round_total;

pub use source::{BookingSource, FxRateSource};

/// Fetches bookings for a range and totals them in the target currency.
///
/// FX rates are memoized per call only; two concurrent summaries never share a
/// cache. A single failed conversion aborts the whole summary.
pub struct BookingSummarizer<B, F> {
    bookings: B,
    fx: F,
}

impl<B, F> BookingSummarizer<B, F> {
    pub fn new(bookings: B, fx: F) -> Self {
        Self { bookings, fx }
    }
}

impl<B, F> BookingSummarizer<B, F>
where
    B: BookingSource,
    F: FxRateSource,
{
    pub async fn summarize(&self, filters: &QueryFilters) -> Result<BookingSummary, QueryError> {
        let bookings =
            self.bookings.bookings_between(filters.start_date, filters.end_date).await?;
        info!(
            event_name = "summary.bookings_retrieved",
            start_date = %filters.start_date,
            end_date = %filters.end_date,
            booking_count = bookings.len(),
            "bookings retrieved for summary"
        );

        let target = CurrencyCode::new(filters.target_currency.as_str());
        let mut rate_cache: HashMap<(CurrencyCode, CurrencyCode), Decimal> = HashMap::new();
        let mut total = Decimal::ZERO;

        for booking in &bookings {
            let source = CurrencyCode::new(booking.currency.as_str());
            if source == target {
                total = accumulate(total, booking.amount, &target)?;
                continue;
            }

            let key = (source, target.clone());
            let rate = match rate_cache.get(&key) {
                Some(rate) => *rate,
                None => {
                    let rate = self.fx.rate(&key.0, &key.1).await.map_err(|source_error| {
                        error!(
                            event_name = "summary.conversion_failed",
                            from = %key.0,
                            to = %key.1,
                            error = %source_error,
                            "could not convert booking currency"
                        );
                        QueryError::ConversionFailed {
                            from: key.0.clone(),
                            to: key.1.clone(),
                            source: source_error,
                        }
                    })?;
                    debug!(
                        event_name = "fx.rate.cached",
                        from = %key.0,
                        to = %key.1,
                        rate = %rate,
                        "fetched FX rate"
                    );
                    rate_cache.insert(key, rate);
                    rate
                }
            };

            let converted = booking
                .amount
                .checked_mul(rate)
                .ok_or_else(|| overflow(&booking.id.0, &target))?;
            total = accumulate(total, converted, &target)?;
        }

        Ok(BookingSummary { total_value: round_total(total), currency: target })
    }
}

fn accumulate(
    total: Decimal,
    amount: Decimal,
    target: &CurrencyCode,
) -> Result<Decimal, QueryError> {
    total.checked_add(amount).ok_or_else(|| overflow("running total", target))
}

fn overflow(at: &str, target: &CurrencyCode) -> QueryError {
    error!(
        event_name = "summary.total_overflow",
        stage = at,
        currency = %target,
        "booking total exceeds the decimal range"
    );
    QueryError::TotalOverflow { currency: target.clone() }
}
