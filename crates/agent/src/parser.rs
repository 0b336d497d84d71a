use std::sync::Arc;

use async_trait::async_trait;
use booksum_core::config::LlmConfig;
use booksum_core::domain::booking::DEFAULT_CURRENCY;
use booksum_core::domain::query::ParsedQuery;
use booksum_core::errors::ParseError;
use booksum_core::interpret::{ParserKind, QueryParser, RuleBasedQueryParser};
use booksum_providers::ClientBuildError;
use chrono::{Local, NaiveDate};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::llm::{FunctionCallRequest, FunctionSpec, LlmClient};
use crate::openai::OpenAiClient;

pub const EXTRACT_FUNCTION: &str = "extract_booking_filters";

/// Returned by the model for both dates when the query carries no date.
pub const UNSUPPORTED_SENTINEL: &str = "UNSUPPORTED";

/// Interprets queries through a forced function call on a language model.
///
/// Every failure mode (transport, no call, bad JSON, sentinel, missing
/// field) collapses into [`ParseError::Unsupported`].
pub struct LlmQueryParser {
    client: Arc<dyn LlmClient>,
    today: Option<NaiveDate>,
}

impl LlmQueryParser {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client, today: None }
    }

    /// Pins the date given to the model instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn request(&self, query: &str) -> FunctionCallRequest {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        FunctionCallRequest {
            system_prompt: system_prompt(today),
            user_message: query.to_string(),
            function: extract_function_spec(),
        }
    }
}

fn system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a booking analytics parser. Given a user query, you MUST call the \
         provided function. If the query contains no date information at all (no month, \
         no year, no specific date), call the function with start_date='{UNSUPPORTED_SENTINEL}' \
         and end_date='{UNSUPPORTED_SENTINEL}'. Never invent dates that are not stated or \
         clearly implied. Today is {}.",
        today.format("%Y-%m-%d")
    )
}

fn extract_function_spec() -> FunctionSpec {
    FunctionSpec {
        name: EXTRACT_FUNCTION.to_string(),
        description: "Extract a concrete date range and optional target currency from a \
                      natural language query about bookings."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "start_date": {
                    "type": "string",
                    "description": "Start of the range as YYYY-MM-DD. For a bare month and year use the first day of that month."
                },
                "end_date": {
                    "type": "string",
                    "description": "End of the range as YYYY-MM-DD. For a bare month and year use the last day of that month."
                },
                "currency": {
                    "type": "string",
                    "description": "Optional 3-letter ISO currency code such as EUR, USD or GBP. Omit when the query names none."
                }
            },
            "required": ["start_date", "end_date"]
        }),
    }
}

fn unsupported(reason: impl Into<String>) -> ParseError {
    ParseError::Unsupported(reason.into())
}

fn required_date(args: &Map<String, Value>, field: &str) -> Result<String, ParseError> {
    match args.get(field).and_then(Value::as_str).map(str::trim) {
        Some(UNSUPPORTED_SENTINEL) => Err(unsupported("query does not contain a date range")),
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(unsupported(format!("model did not provide required field `{field}`"))),
    }
}

/// Validates the raw function arguments returned by the model.
pub fn parse_arguments(raw: &str) -> Result<ParsedQuery, ParseError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|_| unsupported(format!("model returned invalid function arguments: {raw}")))?;
    let Value::Object(args) = value else {
        return Err(unsupported(format!("function arguments are not an object: {raw}")));
    };

    let start_sentinel = args.get("start_date").and_then(Value::as_str) == Some(UNSUPPORTED_SENTINEL);
    let end_sentinel = args.get("end_date").and_then(Value::as_str) == Some(UNSUPPORTED_SENTINEL);
    if start_sentinel || end_sentinel {
        return Err(unsupported("query does not contain a date range"));
    }

    let start_date = required_date(&args, "start_date")?;
    let end_date = required_date(&args, "end_date")?;
    let currency = args
        .get("currency")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Ok(ParsedQuery { start_date, end_date, currency: Some(currency) })
}

#[async_trait]
impl QueryParser for LlmQueryParser {
    fn kind(&self) -> ParserKind {
        ParserKind::LanguageModel
    }

    async fn parse_booking_query(&self, query: &str) -> Result<ParsedQuery, ParseError> {
        let request = self.request(query);
        let call = self
            .client
            .call_function(&request)
            .await
            .map_err(|error| unsupported(format!("model call failed: {error:#}")))?
            .ok_or_else(|| unsupported(format!("model did not call `{EXTRACT_FUNCTION}`")))?;

        if call.name != EXTRACT_FUNCTION {
            return Err(unsupported(format!("model called unexpected function `{}`", call.name)));
        }

        let parsed = parse_arguments(&call.arguments)?;
        debug!(
            event_name = "query.llm.parsed",
            start_date = %parsed.start_date,
            end_date = %parsed.end_date,
            "model extracted booking filters"
        );
        Ok(parsed)
    }
}

/// Chooses the primary parser: the model when a key is configured, else rules.
pub fn create_parser(config: &LlmConfig) -> Result<Arc<dyn QueryParser>, ClientBuildError> {
    match OpenAiClient::from_config(config)? {
        Some(client) => {
            info!(
                event_name = "query.parser.selected",
                parser = ParserKind::LanguageModel.as_str(),
                model = %client.model(),
                "using language model parser with rule-based fallback"
            );
            Ok(Arc::new(LlmQueryParser::new(Arc::new(client))))
        }
        None => {
            info!(
                event_name = "query.parser.selected",
                parser = ParserKind::RuleBased.as_str(),
                "no LLM credential configured, using rule-based parser"
            );
            Ok(Arc::new(RuleBasedQueryParser::new()))
        }
    }
}
