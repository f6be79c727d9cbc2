//! HTTP client for the hosted text-generation endpoint
//! (`models/{model}:generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{GenerationError, RetryPolicy, TextGenerator};
use crate::pipeline::Prompt;

/// Stops generation at the first blank line; the contract wants one line.
const STOP_SEQUENCE: &str = "\n\n";

/// Connection settings and fixed generation parameters for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Endpoint root, e.g. `https://generativelanguage.googleapis.com/v1beta/models`.
    pub base_url: String,
    /// Model id.
    pub model: String,
    /// Provider API key.
    pub api_key: String,
    /// Hard cap on generated tokens.
    pub max_output_tokens: u32,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
    /// Retry policy for 429s and transport failures.
    pub retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "stopSequences")]
    stop_sequences: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Stateless model client, built once and shared across requests.
///
/// One HTTP request per attempt. HTTP 429 and transport failures are
/// retried per [`RetryPolicy`]; any other non-success status fails
/// immediately with the status and body. Dropping the returned future
/// aborts the in-flight request and any pending backoff sleep.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_output_tokens: u32,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Creates a client from settings.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(settings: LlmSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        let endpoint = format!(
            "{}/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model.trim()
        );
        Ok(Self {
            http,
            endpoint,
            api_key: settings.api_key,
            max_output_tokens: settings.max_output_tokens,
            retry: settings.retry,
        })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&self, prompt: &'a Prompt) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part {
                    text: prompt.as_str(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 1.0,
                max_output_tokens: self.max_output_tokens,
                stop_sequences: [STOP_SEQUENCE],
            },
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let body = self.request_body(prompt);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let sent = self
                .http
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    if !self.retry.can_retry(attempt) {
                        return Err(GenerationError::Network {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    let delay = self.retry.network_delay();
                    tracing::warn!(attempt, error = %e, ?delay, "model request failed, retrying");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if !self.retry.can_retry(attempt) {
                    return Err(GenerationError::RateLimited { attempts: attempt });
                }
                let delay = self.retry.rate_limit_delay(attempt);
                tracing::warn!(attempt, ?delay, "model rate limited, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(GenerationError::Upstream {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let envelope: GenerateResponse = response
                .json()
                .await
                .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

            tracing::debug!(attempt, "model responded");
            return first_text(envelope);
        }
    }
}

/// Extracts the first text part of the first candidate.
fn first_text(envelope: GenerateResponse) -> Result<String, GenerationError> {
    envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            GenerationError::MalformedResponse("missing candidates[0].content.parts[0].text".to_string())
        })
}
