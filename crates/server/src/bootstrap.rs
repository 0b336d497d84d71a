use std::sync::Arc;

use booksum_agent::HttpBookingQueryAgent;
use booksum_core::config::{AppConfig, ConfigError};
use booksum_providers::ClientBuildError;
use thiserror::Error;
use tracing::info;

use crate::health::HealthState;
use crate::query::{QueryAnswerer, QueryState};

pub struct Application {
    pub config: AppConfig,
    pub agent: Arc<HttpBookingQueryAgent>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("provider client setup failed: {0}")]
    Clients(#[from] ClientBuildError),
}

impl Application {
    pub fn query_state(&self) -> QueryState {
        QueryState::new(self.agent.clone())
    }

    pub fn health_state(&self) -> HealthState {
        HealthState::new(self.agent.interpreter_mode(), self.config.fx.is_configured())
    }
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let agent = Arc::new(HttpBookingQueryAgent::from_config(&config)?);
    info!(
        event_name = "system.bootstrap.agent_ready",
        interpreter_mode = agent.interpreter_mode().as_str(),
        fx_configured = config.fx.is_configured(),
        bookings_base_url = %config.bookings.base_url,
        "booking query agent initialized"
    );

    Ok(Application { config, agent })
}
