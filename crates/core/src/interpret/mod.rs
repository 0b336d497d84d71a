//! Free text to [`QueryFilters`].
//!
//! An interpreter holds one primary [`QueryParser`]. When the primary is the
//! rule-based parser it is also the terminal parser and its failures
//! propagate unchanged. Any other primary gets the rule-based parser as a
//! fallback, retried once on any primary failure.

pub mod rule_based;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::booking::{CurrencyCode, DEFAULT_CURRENCY};
use crate::domain::query::{ParsedQuery, QueryFilters};
use crate::errors::{ParseError, QueryError};

pub use rule_based::RuleBasedQueryParser;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    RuleBased,
    LanguageModel,
}

impl ParserKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::LanguageModel => "language_model",
        }
    }
}

#[async_trait]
pub trait QueryParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    async fn parse_booking_query(&self, query: &str) -> Result<ParsedQuery, ParseError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpreterMode {
    RuleBasedOnly,
    ConfiguredWithLlm,
}

impl InterpreterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuleBasedOnly => "rule_based_only",
            Self::ConfiguredWithLlm => "configured_with_llm",
        }
    }
}

#[derive(Clone)]
pub struct QueryInterpreter {
    primary: Arc<dyn QueryParser>,
    fallback: Option<RuleBasedQueryParser>,
}

impl Default for QueryInterpreter {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl QueryInterpreter {
    pub fn new(primary: Arc<dyn QueryParser>) -> Self {
        let fallback = match primary.kind() {
            ParserKind::RuleBased => None,
            ParserKind::LanguageModel => Some(RuleBasedQueryParser::new()),
        };
        Self { primary, fallback }
    }

    pub fn rule_based() -> Self {
        Self::new(Arc::new(RuleBasedQueryParser::new()))
    }

    pub fn mode(&self) -> InterpreterMode {
        if self.fallback.is_some() {
            InterpreterMode::ConfiguredWithLlm
        } else {
            InterpreterMode::RuleBasedOnly
        }
    }

    pub async fn interpret(&self, query: &str) -> Result<QueryFilters, QueryError> {
        let parsed = match self.primary.parse_booking_query(query).await {
            Ok(parsed) => parsed,
            Err(primary_error) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        event_name = "query.fallback",
                        primary = self.primary.kind().as_str(),
                        error = %primary_error,
                        "primary parser failed, retrying with rule-based parser"
                    );
                    fallback.parse(query)?
                }
                None => return Err(primary_error.into()),
            },
        };

        let filters = normalize(parsed)?;
        debug!(
            event_name = "query.interpreted",
            query = %query,
            start_date = %filters.start_date,
            end_date = %filters.end_date,
            currency = %filters.target_currency,
            "interpreted booking query"
        );
        Ok(filters)
    }
}

/// Turns raw parser output into typed filters. A malformed date here is a
/// parser defect, not a user error.
pub fn normalize(parsed: ParsedQuery) -> Result<QueryFilters, QueryError> {
    let dates = (parse_iso_date(&parsed.start_date), parse_iso_date(&parsed.end_date));
    let (Some(start_date), Some(end_date)) = dates else {
        return Err(QueryError::InvalidParserOutput {
            start_date: parsed.start_date,
            end_date: parsed.end_date,
        });
    };

    let currency = parsed
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CURRENCY);

    Ok(QueryFilters { start_date, end_date, target_currency: CurrencyCode::new(currency) })
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
