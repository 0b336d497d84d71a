use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::domain::booking::DEFAULT_CURRENCY;
use crate::domain::query::ParsedQuery;
use crate::errors::ParseError;
use crate::interpret::{ParserKind, QueryParser};

/// Scanned in this order; the first code present anywhere in the query wins.
pub const SUPPORTED_CURRENCIES: [&str; 7] = ["EUR", "USD", "GBP", "JPY", "CHF", "AUD", "CAD"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static MONTH_YEAR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn month_year_pattern() -> &'static Regex {
    MONTH_YEAR_PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{4})",
        )
        .expect("month/year pattern is a valid regex")
    })
}

/// Deterministic "Month YYYY" extractor. Never touches the network.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedQueryParser;

impl RuleBasedQueryParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, query: &str) -> Result<ParsedQuery, ParseError> {
        let (start, end) = extract_month_range(query).ok_or_else(|| {
            ParseError::Unparseable("no month and year found in query".to_string())
        })?;

        let currency = match detect_currency(query) {
            Some(code) => code,
            None => {
                info!(
                    event_name = "query.currency_defaulted",
                    query = %query,
                    default_currency = DEFAULT_CURRENCY,
                    "no explicit currency found in query, defaulting"
                );
                DEFAULT_CURRENCY
            }
        };

        Ok(ParsedQuery {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            currency: Some(currency.to_string()),
        })
    }
}

#[async_trait]
impl QueryParser for RuleBasedQueryParser {
    fn kind(&self) -> ParserKind {
        ParserKind::RuleBased
    }

    async fn parse_booking_query(&self, query: &str) -> Result<ParsedQuery, ParseError> {
        self.parse(query)
    }
}

/// First and last calendar day of the first "Month YYYY" mention.
pub fn extract_month_range(query: &str) -> Option<(NaiveDate, NaiveDate)> {
    let captures = month_year_pattern().captures(query)?;
    let month_name = captures.get(1)?.as_str().to_ascii_lowercase();
    let year = captures.get(2)?.as_str().parse::<i32>().ok()?;
    let month = MONTHS.iter().position(|candidate| *candidate == month_name)? as u32 + 1;

    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = last_day_of_month(year, month)?;
    Some((start, end))
}

pub fn detect_currency(query: &str) -> Option<&'static str> {
    let upper = query.to_ascii_uppercase();
    SUPPORTED_CURRENCIES.iter().copied().find(|code| upper.contains(code))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
