use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A single function the model is forced to call.
#[derive(Clone, Debug)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug)]
pub struct FunctionCallRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub function: FunctionSpec,
}

/// Raw arguments are returned unparsed; validating them is the caller's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `Ok(None)` means the model answered without calling the function.
    async fn call_function(&self, request: &FunctionCallRequest) -> Result<Option<FunctionCall>>;
}
