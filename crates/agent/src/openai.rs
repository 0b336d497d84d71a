use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use booksum_core::config::LlmConfig;
use booksum_providers::{build_client, ClientBuildError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::llm::{FunctionCall, FunctionCallRequest, LlmClient};

/// Chat-completions client for OpenAI and API-compatible gateways.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, ClientBuildError> {
        match &config.api_key {
            Some(api_key) if config.is_enabled() => Self::new(
                &config.base_url,
                api_key.clone(),
                config.model.clone(),
                config.timeout_secs,
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Debug, Deserialize)]
struct ToolFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn call_function(&self, request: &FunctionCallRequest) -> Result<Option<FunctionCall>> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_message },
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": request.function.name,
                    "description": request.function.description,
                    "parameters": request.function.parameters,
                },
            }],
            "tool_choice": {
                "type": "function",
                "function": { "name": request.function.name },
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            bail!("chat completion returned status {}: {detail}", status.as_u16());
        }

        let completion: ChatCompletion =
            response.json().await.context("chat completion body is not valid JSON")?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion contained no choices"))?;

        let call = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| FunctionCall { name: call.function.name, arguments: call.function.arguments });

        debug!(
            event_name = "llm.completion.received",
            model = %self.model,
            function_called = call.is_some(),
            "received chat completion"
        );
        Ok(call)
    }
}
