use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::booking::CurrencyCode;
use crate::domain::query::QueryFilters;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub total_value: Decimal,
    pub currency: CurrencyCode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentResult {
    pub message: String,
    pub filters: QueryFilters,
    pub total_value: Decimal,
    pub currency: CurrencyCode,
}
