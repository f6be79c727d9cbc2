//! Analytics service: orchestrates one question through the pipeline.

use std::sync::Arc;

use crate::domain::{AnswerResult, PipelineStage, SanitizedOutput, SchemaContract};
use crate::error::AnalyticsError;
use crate::llm::{GenerationError, TextGenerator};
use crate::persistence::QueryExecutor;
use crate::pipeline::{build_prompt, clean, validator};

/// Orchestration layer for the question → answer pipeline.
///
/// Stateless coordinator: owns the schema contract and shared handles to
/// a [`TextGenerator`] and a [`QueryExecutor`]. Every question follows
/// the pattern: build prompt → generate → sanitize → validate → execute,
/// and ends in exactly one of `Answered`, `Rejected` or `Failed`.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    contract: SchemaContract,
    generator: Arc<dyn TextGenerator>,
    executor: Arc<dyn QueryExecutor>,
}

impl AnalyticsService {
    /// Creates a new `AnalyticsService`.
    #[must_use]
    pub fn new(
        contract: SchemaContract,
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            contract,
            generator,
            executor,
        }
    }

    /// Returns the schema contract questions are answered against.
    #[must_use]
    pub fn contract(&self) -> &SchemaContract {
        &self.contract
    }

    /// Answers one question.
    ///
    /// Returns `None` without doing anything when the question is empty
    /// after trimming. Otherwise returns exactly one [`AnswerResult`];
    /// pipeline errors are folded into its user-facing message.
    pub async fn answer(&self, question: &str) -> Option<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let result = match self.run(question).await {
            Ok(value) => {
                tracing::info!(stage = %PipelineStage::Answered, value, "question answered");
                AnswerResult::answered(value)
            }
            Err(e) if e.is_rejection() => {
                tracing::warn!(stage = %PipelineStage::Rejected, error = %e, "question rejected");
                AnswerResult::rejected(e.user_message())
            }
            Err(e) => {
                tracing::warn!(stage = %PipelineStage::Failed, error = %e, "question failed");
                AnswerResult::failed(e.user_message())
            }
        };
        Some(result)
    }

    async fn run(&self, question: &str) -> Result<i64, AnalyticsError> {
        tracing::debug!(stage = %PipelineStage::Generating);
        let prompt = build_prompt(&self.contract, question);
        let raw = self.generator.generate(&prompt).await?;

        tracing::debug!(stage = %PipelineStage::Sanitizing);
        let statement = match clean(&raw) {
            SanitizedOutput::Statement(statement) => statement,
            SanitizedOutput::Unanswerable => return Err(AnalyticsError::Unanswerable),
            SanitizedOutput::Empty => {
                return Err(GenerationError::MalformedResponse(
                    "model returned no statement".to_string(),
                )
                .into());
            }
        };

        tracing::debug!(stage = %PipelineStage::Validating, sql = %statement);
        validator::check(statement.as_str()).map_err(AnalyticsError::UnsafeStatement)?;

        tracing::debug!(stage = %PipelineStage::Executing);
        self.executor
            .execute(&statement)
            .await
            .map_err(AnalyticsError::from)
    }
}
