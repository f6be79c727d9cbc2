//! Question and answer DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AnswerResult, PipelineStage};

/// Request body for `POST /api/v1/answer`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Natural-language question about the video statistics.
    pub question: String,
    /// Identity of the asker, checked against the allow-list.
    #[serde(default)]
    pub requester: Option<String>,
}

/// Response body for `POST /api/v1/answer`.
///
/// Exactly one of `value` / `error` is non-null.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Identifier of this question, for log correlation.
    pub request_id: uuid::Uuid,
    /// Scalar answer.
    pub value: Option<i64>,
    /// User-facing error message.
    pub error: Option<String>,
    /// Terminal pipeline stage.
    pub stage: PipelineStage,
    /// When the answer was produced.
    pub answered_at: DateTime<Utc>,
}

impl AnswerResponse {
    /// Wraps a pipeline result.
    #[must_use]
    pub fn new(request_id: uuid::Uuid, result: AnswerResult) -> Self {
        Self {
            request_id,
            value: result.value,
            error: result.error,
            stage: result.stage,
            answered_at: Utc::now(),
        }
    }
}
