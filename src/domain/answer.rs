//! Per-request answer value and pipeline stages.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Stage of the question → answer state machine.
///
/// `Received → Generating → Sanitizing → Validating → Executing`, ending
/// in exactly one of [`PipelineStage::Answered`], [`PipelineStage::Rejected`]
/// or [`PipelineStage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Question accepted, nothing done yet.
    Received,
    /// Prompt built, model call in flight.
    Generating,
    /// Raw model text being cleaned.
    Sanitizing,
    /// Statement going through the safety gate.
    Validating,
    /// Statement running against the analytical store.
    Executing,
    /// Scalar result produced.
    Answered,
    /// Model declined or safety gate refused.
    Rejected,
    /// Generation or execution failed.
    Failed,
}

impl PipelineStage {
    /// Returns the snake_case stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Generating => "generating",
            Self::Sanitizing => "sanitizing",
            Self::Validating => "validating",
            Self::Executing => "executing",
            Self::Answered => "answered",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one question.
///
/// Exactly one of `value` / `error` is set. A `NULL` scalar from the store
/// has already been coerced to `0` by the time it lands here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AnswerResult {
    /// Scalar answer.
    pub value: Option<i64>,
    /// User-facing error message.
    pub error: Option<String>,
    /// Terminal stage that produced this result.
    pub stage: PipelineStage,
}

impl AnswerResult {
    /// A successful scalar answer.
    #[must_use]
    pub fn answered(value: i64) -> Self {
        Self {
            value: Some(value),
            error: None,
            stage: PipelineStage::Answered,
        }
    }

    /// The question was declined before execution.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(message.into()),
            stage: PipelineStage::Rejected,
        }
    }

    /// Generation or execution failed.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(message.into()),
            stage: PipelineStage::Failed,
        }
    }

    /// Returns `true` if a scalar was produced.
    #[must_use]
    pub const fn is_answered(&self) -> bool {
        matches!(self.stage, PipelineStage::Answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_exactly_one_side() {
        let ok = AnswerResult::answered(42);
        assert_eq!(ok.value, Some(42));
        assert!(ok.error.is_none());
        assert!(ok.is_answered());

        let rejected = AnswerResult::rejected("nope");
        assert!(rejected.value.is_none());
        assert_eq!(rejected.stage, PipelineStage::Rejected);

        let failed = AnswerResult::failed("boom");
        assert!(failed.value.is_none());
        assert_eq!(failed.stage, PipelineStage::Failed);
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::Answered).ok();
        assert_eq!(json.as_deref(), Some("\"answered\""));
    }
}
