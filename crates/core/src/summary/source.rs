use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::booking::{Booking, CurrencyCode};
use crate::errors::{BookingSourceError, FxError};

/// Supplies every booking whose record date falls in `[start_date, end_date]`.
/// Implementations own pagination; callers receive the complete set.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn bookings_between(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingSourceError>;
}

/// Resolves a positive rate with `amount_in_from * rate == amount_in_to`.
#[async_trait]
pub trait FxRateSource: Send + Sync {
    async fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, FxError>;
}

#[async_trait]
impl<T> BookingSource for std::sync::Arc<T>
where
    T: BookingSource + ?Sized,
{
    async fn bookings_between(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingSourceError> {
        (**self).bookings_between(start_date, end_date).await
    }
}

#[async_trait]
impl<T> FxRateSource for std::sync::Arc<T>
where
    T: FxRateSource + ?Sized,
{
    async fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, FxError> {
        (**self).rate(from, to).await
    }
}
