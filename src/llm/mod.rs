//! LLM client layer: the [`TextGenerator`] seam, the HTTP client for the
//! hosted model, and its retry policy.
//!
//! The orchestrator only sees [`TextGenerator`], so tests substitute a
//! scripted fake for the network client.

pub mod gemini;
pub mod retry;

use async_trait::async_trait;

use crate::pipeline::Prompt;

pub use gemini::{GeminiClient, LlmSettings};
pub use retry::RetryPolicy;

/// Failure of a model call after the retry budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Every attempt was answered with HTTP 429.
    #[error("model rate limited after {attempts} attempts")]
    RateLimited {
        /// Attempts made.
        attempts: u32,
    },

    /// Non-retryable HTTP status from the provider.
    #[error("model API error ({status}): {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Transport failure on every attempt.
    #[error("network error after {attempts} attempts: {message}")]
    Network {
        /// Attempts made.
        attempts: u32,
        /// Last transport error.
        message: String,
    },

    /// The response envelope lacked the generated text.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generates raw text for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] once retries are exhausted or on a
    /// non-retryable failure.
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}
