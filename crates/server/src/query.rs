use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use booksum_agent::BookingQueryAgent;
use booksum_core::domain::summary::AgentResult;
use booksum_core::errors::{InterfaceError, QueryError};
use booksum_core::interpret::InterpreterMode;
use booksum_core::summary::{BookingSource, FxRateSource};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

const DEMO_PAGE: &str = include_str!("../static/index.html");

/// Seam between the HTTP layer and the agent so routes can run on fakes.
#[async_trait]
pub trait QueryAnswerer: Send + Sync {
    fn interpreter_mode(&self) -> InterpreterMode;

    async fn answer(&self, query: &str) -> Result<AgentResult, QueryError>;
}

#[async_trait]
impl<B, F> QueryAnswerer for BookingQueryAgent<B, F>
where
    B: BookingSource + 'static,
    F: FxRateSource + 'static,
{
    fn interpreter_mode(&self) -> InterpreterMode {
        self.mode()
    }

    async fn answer(&self, query: &str) -> Result<AgentResult, QueryError> {
        self.handle_query(query).await
    }
}

#[derive(Clone)]
pub struct QueryState {
    agent: Arc<dyn QueryAnswerer>,
}

impl QueryState {
    pub fn new(agent: Arc<dyn QueryAnswerer>) -> Self {
        Self { agent }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResponse {
    pub message: String,
    pub total_value: f64,
    pub currency: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<AgentResult> for QueryResponse {
    fn from(result: AgentResult) -> Self {
        Self {
            message: result.message,
            total_value: result.total_value.to_f64().unwrap_or_default(),
            currency: result.currency.to_string(),
            start_date: result.filters.start_date.format("%Y-%m-%d").to_string(),
            end_date: result.filters.end_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { detail: self.0.reason().to_string() })).into_response()
    }
}

pub fn router(state: QueryState) -> Router {
    Router::new()
        .route("/", get(demo_page))
        .route("/query", post(handle_query))
        .with_state(state)
}

async fn demo_page() -> Html<&'static str> {
    Html(DEMO_PAGE)
}

pub async fn handle_query(
    State(state): State<QueryState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    match state.agent.answer(&request.query).await {
        Ok(result) => {
            info!(
                event_name = "http.query.completed",
                correlation_id = %correlation_id,
                currency = %result.currency,
                "query answered"
            );
            Ok(Json(QueryResponse::from(result)))
        }
        Err(query_error) => {
            let kind = query_error.kind();
            let interface = query_error.into_interface(correlation_id.clone());
            match &interface {
                InterfaceError::Internal { .. } => error!(
                    event_name = "http.query.failed",
                    correlation_id = %correlation_id,
                    error_kind = kind.as_str(),
                    reason = %interface.reason(),
                    "query failed"
                ),
                _ => warn!(
                    event_name = "http.query.failed",
                    correlation_id = %correlation_id,
                    error_kind = kind.as_str(),
                    reason = %interface.reason(),
                    "query failed"
                ),
            }
            Err(ApiError(interface))
        }
    }
}
