use std::fs;
use std::path::Path;

use booksum_agent::create_parser;
use booksum_core::config::{AppConfig, LoadOptions};
use booksum_core::domain::booking::DEFAULT_CURRENCY;
use booksum_core::domain::query::ParsedQuery;
use booksum_core::interpret::QueryParser;
use serde::{Deserialize, Serialize};

use crate::commands::{block_on, CommandResult};

const COMMAND: &str = "eval";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EvalCase {
    pub query: String,
    #[serde(default)]
    pub expected: Expected,
}

/// Unset date or currency fields are not compared.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Expected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub expect_error: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Ok,
    OkError,
    Mismatch,
    MismatchExpectedError,
    Error,
}

impl CaseStatus {
    fn passed(self) -> bool {
        matches!(self, Self::Ok | Self::OkError)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CaseOutcome {
    pub query: String,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedQuery>,
    pub expected: Expected,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EvalReport {
    pub parser: &'static str,
    pub total: usize,
    pub passed: usize,
    pub accuracy_pct: f64,
    pub results: Vec<CaseOutcome>,
}

pub fn default_dataset() -> Vec<EvalCase> {
    let case = |query: &str, start: Option<&str>, end: Option<&str>, currency: &str, error: bool| {
        EvalCase {
            query: query.to_string(),
            expected: Expected {
                start_date: start.map(str::to_string),
                end_date: end.map(str::to_string),
                currency: Some(currency.to_string()),
                expect_error: error,
            },
        }
    };

    vec![
        case("Show me all the bookings you have in USD", None, None, "USD", true),
        case(
            "Show me bookings in November 2024 in USD",
            Some("2024-11-01"),
            Some("2024-11-30"),
            "USD",
            false,
        ),
        case(
            "Prikaži rezervacije za ožujak 2023 u eurima",
            Some("2023-03-01"),
            Some("2023-03-31"),
            "EUR",
            false,
        ),
        case(
            "bookings 2024-11-10 to 2024-11-20",
            Some("2024-11-10"),
            Some("2024-11-20"),
            "EUR",
            false,
        ),
    ]
}

pub async fn evaluate(parser: &dyn QueryParser, cases: &[EvalCase]) -> EvalReport {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let outcome = match parser.parse_booking_query(&case.query).await {
            Ok(parsed) => {
                let status = if case.expected.expect_error {
                    CaseStatus::MismatchExpectedError
                } else if matches_expected(&parsed, &case.expected) {
                    CaseStatus::Ok
                } else {
                    CaseStatus::Mismatch
                };
                CaseOutcome {
                    query: case.query.clone(),
                    status,
                    parsed: Some(parsed),
                    expected: case.expected.clone(),
                    error: None,
                }
            }
            Err(error) => CaseOutcome {
                query: case.query.clone(),
                status: if case.expected.expect_error { CaseStatus::OkError } else { CaseStatus::Error },
                parsed: None,
                expected: case.expected.clone(),
                error: Some(error.to_string()),
            },
        };
        results.push(outcome);
    }

    let total = results.len();
    let passed = results.iter().filter(|outcome| outcome.status.passed()).count();
    let accuracy_pct = if total == 0 { 0.0 } else { passed as f64 * 100.0 / total as f64 };

    EvalReport { parser: parser.kind().as_str(), total, passed, accuracy_pct, results }
}

fn matches_expected(parsed: &ParsedQuery, expected: &Expected) -> bool {
    let start_ok = expected.start_date.as_deref().map_or(true, |start| parsed.start_date == start);
    let end_ok = expected.end_date.as_deref().map_or(true, |end| parsed.end_date == end);
    let parsed_currency = parsed.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let currency_ok = expected
        .currency
        .as_deref()
        .map_or(true, |currency| parsed_currency.eq_ignore_ascii_case(currency));
    start_ok && end_ok && currency_ok
}

fn load_dataset(path: &Path) -> Result<Vec<EvalCase>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read dataset `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse dataset `{}`: {error}", path.display()))
}

pub fn run(dataset: Option<&Path>) -> CommandResult {
    let llm = match AppConfig::load_llm(LoadOptions::default()) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let cases = match dataset.map(load_dataset).transpose() {
        Ok(Some(cases)) => cases,
        Ok(None) => default_dataset(),
        Err(error) => return CommandResult::failure(COMMAND, "dataset", error, 2),
    };

    let parser = match create_parser(&llm) {
        Ok(parser) => parser,
        Err(error) => return CommandResult::failure(COMMAND, "client_setup", error.to_string(), 2),
    };

    let report = match block_on(COMMAND, evaluate(parser.as_ref(), &cases)) {
        Ok(report) => report,
        Err(failure) => return failure,
    };

    let message = format!(
        "{} parser: {}/{} correct ({:.1}% accuracy)",
        report.parser, report.passed, report.total, report.accuracy_pct
    );
    match serde_json::to_value(&report) {
        Ok(data) => CommandResult::success_with_data(COMMAND, message, Some(data)),
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
    }
}
