use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::booking::CurrencyCode;

/// Raw interpreter output. Dates are still strings and have not been checked
/// against the calendar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Normalized filters produced once per query. The range is inclusive on both
/// ends; `start_date <= end_date` is the interpreter's responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryFilters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_currency: CurrencyCode,
}
