use booksum_core::config::AppConfig;
use booksum_core::domain::query::QueryFilters;
use booksum_core::domain::summary::{AgentResult, BookingSummary};
use booksum_core::errors::QueryError;
use booksum_core::interpret::{InterpreterMode, QueryInterpreter};
use booksum_core::money::format_amount;
use booksum_core::summary::{BookingSource, BookingSummarizer, FxRateSource};
use booksum_providers::{ClientBuildError, HttpBookingSource, HttpFxRateSource};
use tracing::info;

use crate::parser::create_parser;

pub type HttpBookingQueryAgent = BookingQueryAgent<HttpBookingSource, HttpFxRateSource>;

/// Interpretation followed by summarization, rendered as one sentence.
pub struct BookingQueryAgent<B, F> {
    interpreter: QueryInterpreter,
    summarizer: BookingSummarizer<B, F>,
}

impl<B, F> BookingQueryAgent<B, F> {
    pub fn new(interpreter: QueryInterpreter, summarizer: BookingSummarizer<B, F>) -> Self {
        Self { interpreter, summarizer }
    }

    pub fn mode(&self) -> InterpreterMode {
        self.interpreter.mode()
    }
}

impl HttpBookingQueryAgent {
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientBuildError> {
        let interpreter = QueryInterpreter::new(create_parser(&config.llm)?);
        let bookings = HttpBookingSource::from_config(&config.bookings)?;
        let fx = HttpFxRateSource::from_config(&config.fx)?;
        Ok(Self::new(interpreter, BookingSummarizer::new(bookings, fx)))
    }
}

impl<B, F> BookingQueryAgent<B, F>
where
    B: BookingSource,
    F: FxRateSource,
{
    pub async fn handle_query(&self, query: &str) -> Result<AgentResult, QueryError> {
        let filters = self.interpreter.interpret(query).await?;
        let summary = self.summarizer.summarize(&filters).await?;
        let message = render_message(&filters, &summary);

        info!(
            event_name = "agent.query.answered",
            start_date = %filters.start_date,
            end_date = %filters.end_date,
            currency = %summary.currency,
            total_value = %summary.total_value,
            "answered booking query"
        );

        Ok(AgentResult {
            message,
            filters,
            total_value: summary.total_value,
            currency: summary.currency,
        })
    }
}

pub fn render_message(filters: &QueryFilters, summary: &BookingSummary) -> String {
    format!(
        "The total value of bookings between {} and {} was {} {}.",
        filters.start_date.format("%Y-%m-%d"),
        filters.end_date.format("%Y-%m-%d"),
        format_amount(summary.total_value),
        summary.currency
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use booksum_core::domain::booking::{Booking, CurrencyCode};
    use booksum_core::domain::query::QueryFilters;
    use booksum_core::domain::summary::BookingSummary;
    use booksum_core::errors::{BookingSourceError, ErrorKind, FxError};
    use booksum_core::interpret::QueryInterpreter;
    use booksum_core::summary::{BookingSource, BookingSummarizer, FxRateSource};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{render_message, BookingQueryAgent};

    struct FixedBookings(Vec<Booking>);

    #[async_trait]
    impl BookingSource for FixedBookings {
        async fn bookings_between(
            &self,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> Result<Vec<Booking>, BookingSourceError> {
            Ok(self
                .0
                .iter()
                .filter(|booking| booking.check_in >= start_date && booking.check_in <= end_date)
                .cloned()
                .collect())
        }
    }

    struct FixedRate(Decimal);

    #[async_trait]
    impl FxRateSource for FixedRate {
        async fn rate(&self, _from: &CurrencyCode, _to: &CurrencyCode) -> Result<Decimal, FxError> {
            Ok(self.0)
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn agent(bookings: Vec<Booking>, rate: Decimal) -> BookingQueryAgent<Arc<FixedBookings>, FixedRate> {
        BookingQueryAgent::new(
            QueryInterpreter::rule_based(),
            BookingSummarizer::new(Arc::new(FixedBookings(bookings)), FixedRate(rate)),
        )
    }

    #[tokio::test]
    async fn renders_total_for_month_in_requested_currency() {
        let agent = agent(
            vec![
                Booking::new("1", date(2024, 11, 3), "EUR", Decimal::new(100, 0)),
                Booking::new("2", date(2024, 11, 20), "USD", Decimal::new(100, 0)),
                Booking::new("3", date(2024, 12, 1), "USD", Decimal::new(9_999, 0)),
            ],
            Decimal::new(2, 0),
        );

        let result = agent.handle_query("Show me bookings in November 2024").await.expect("ok");

        assert_eq!(result.total_value, Decimal::new(30_000, 2));
        assert_eq!(result.currency.as_str(), "EUR");
        assert_eq!(
            result.message,
            "The total value of bookings between 2024-11-01 and 2024-11-30 was 300.00 EUR."
        );
    }

    #[tokio::test]
    async fn large_totals_use_thousands_separators() {
        let agent = agent(
            vec![Booking::new("1", date(2023, 3, 9), "USD", Decimal::new(123_456_789, 2))],
            Decimal::ONE,
        );

        let result = agent.handle_query("march 2023 in USD").await.expect("ok");

        assert_eq!(
            result.message,
            "The total value of bookings between 2023-03-01 and 2023-03-31 was 1,234,567.89 USD."
        );
    }

    #[tokio::test]
    async fn unparseable_query_surfaces_interpreter_error() {
        let agent = agent(Vec::new(), Decimal::ONE);
        let error = agent.handle_query("Show me all the bookings you have in USD").await;
        assert_eq!(error.expect_err("should fail").kind(), ErrorKind::UnparseableQuery);
    }

    #[test]
    fn message_renders_zero_totals() {
        let filters = QueryFilters {
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            target_currency: CurrencyCode::new("JPY"),
        };
        let summary =
            BookingSummary { total_value: Decimal::ZERO, currency: CurrencyCode::new("JPY") };

        assert_eq!(
            render_message(&filters, &summary),
            "The total value of bookings between 2024-01-01 and 2024-01-31 was 0.00 JPY."
        );
    }
}
