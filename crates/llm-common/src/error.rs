/// Error types for calls into a generative text service.
///
/// These represent failures of the outbound model call itself. Crates that consume
/// generated text define their own error enums and wrap `LlmError` via `#[from]`.
use std::time::Duration;

use crate::openai::OpenAiClientError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(transparent)]
    Client(#[from] OpenAiClientError),

    #[error("completion contained no text (model={model})")]
    EmptyCompletion { model: String },

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation failed: {0}")]
    Other(String),
}
