//! LLM access — the `ChatModel` seam and its HTTP-backed implementation.
//!
//! The orchestration loop and the query extractor only depend on
//! `ChatModel`; `LlmPool` binds the raw client to a configured model.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::transcript::Message;
use client::{LlmError, OpenAiClient};
use types::{ChatCompletionRequest, Completion, ToolDefinition, WireMessage};

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete the conversation in `messages`. An empty `tools` slice sends no
    /// tool schema at all.
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<Completion, LlmError>;
}

/// Chat-completions client bound to a model.
#[derive(Debug)]
pub struct LlmPool {
    client: OpenAiClient,
    model: String,
    temperature: Option<f32>,
}

impl LlmPool {
    /// Create a pool with an explicit API key and model.
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self::from_client(OpenAiClient::new(api_key, timeout)?, model))
    }

    /// Create a pool reading OPENAI_TOKEN from the environment.
    pub fn from_env(model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = std::env::var("OPENAI_TOKEN").map_err(|_| {
            LlmError::MissingApiKey("OPENAI_TOKEN environment variable not set".into())
        })?;
        Self::new(api_key, model, timeout)
    }

    /// Create a pool with a custom base URL.
    pub fn with_base_url(
        api_key: String,
        model: &str,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self::from_client(
            OpenAiClient::with_base_url(api_key, base_url, timeout)?,
            model,
        ))
    }

    fn from_client(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for LlmPool {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<Completion, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.to_vec())
            },
            temperature: self.temperature,
        };

        let response = self.client.chat_completions(&request).await?;
        if let Some(usage) = response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion"
            );
        }
        response
            .into_completion()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".into()))
    }
}
