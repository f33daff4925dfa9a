//! The `generate(prompt) -> text` capability that downstream crates depend on.
//!
//! Consumers hold an `Arc<dyn TextGenerator>` and never see the transport. Tests
//! substitute an in-memory implementation.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::LlmError;
use crate::openai::{ChatCompletionRequest, Message, OpenAiClient};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Single-model generator backed by an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct ChatGenerator {
    client: Arc<OpenAiClient>,
    model: String,
}

impl ChatGenerator {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: None,
            max_tokens: None,
        };
        let response = self.client.chat_completions(&request, None).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::EmptyCompletion {
                model: self.model.clone(),
            })
    }
}
