use booksum_agent::HttpBookingQueryAgent;
use booksum_core::config::{AppConfig, LoadOptions};
use serde_json::json;

use crate::commands::{block_on, CommandResult};

const COMMAND: &str = "ask";

pub fn run(query: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2),
    };

    let agent = match HttpBookingQueryAgent::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => return CommandResult::failure(COMMAND, "client_setup", error.to_string(), 2),
    };

    let outcome = match block_on(COMMAND, agent.handle_query(query)) {
        Ok(outcome) => outcome,
        Err(failure) => return failure,
    };

    match outcome {
        Ok(result) => {
            let data = json!({
                "total_value": result.total_value.to_string(),
                "currency": result.currency.as_str(),
                "start_date": result.filters.start_date.format("%Y-%m-%d").to_string(),
                "end_date": result.filters.end_date.format("%Y-%m-%d").to_string(),
            });
            CommandResult::success_with_data(COMMAND, result.message, Some(data))
        }
        Err(error) => CommandResult::failure(COMMAND, error.kind().as_str(), error.to_string(), 1),
    }
}
