//! Error types.
//!
//! [`AnalyticsError`] is the closed taxonomy of ways a question can fail
//! inside the pipeline. It is translated to a user-facing message in one
//! place, [`AnalyticsError::user_message`], and never reaches callers as an
//! HTTP error.
//!
//! [`GatewayError`] covers failures of the HTTP surface itself (bad body,
//! requester not allowed, throttled). Each variant maps to a specific HTTP
//! status code and structured JSON error response.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::llm::GenerationError;
use crate::persistence::ExecutionError;
use crate::pipeline::Violation;

/// Shown when the model call fails or returns nothing usable.
pub const MSG_GENERATION_FAILED: &str = "Не удалось сгенерировать SQL запрос";

/// Shown when the model declines with the sentinel phrase.
pub const MSG_UNANSWERABLE: &str = "Этот запрос нельзя корректно посчитать по текущим данным. \
     Уточните, по какому полю сортировать и какую метрику использовать.";

/// Shown when the safety gate refuses a statement.
pub const MSG_UNSAFE: &str = "Запрос содержит недопустимые операции";

/// Prefix of database failure messages; the engine text follows.
pub const MSG_DATABASE_PREFIX: &str = "Ошибка базы данных: ";

/// Shown when a statement exceeds the execution bound.
pub const MSG_QUERY_TIMEOUT: &str = "Превышено время выполнения запроса к базе данных";

/// Why a question ended without an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    /// The model call failed, or produced no usable text.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The model declined under the schema contract.
    #[error("question cannot be answered from the schema")]
    Unanswerable,

    /// The statement failed the safety gate.
    #[error("unsafe statement: {0:?}")]
    UnsafeStatement(Violation),

    /// The store rejected or failed the statement.
    #[error("database error: {0}")]
    Database(String),

    /// The statement ran past the execution bound.
    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),
}

impl From<ExecutionError> for AnalyticsError {
    fn from(e: ExecutionError) -> Self {
        match e {
            ExecutionError::Timeout(limit) => Self::QueryTimeout(limit),
            ExecutionError::Database(message) => Self::Database(message),
            ExecutionError::Shape(message) => Self::Database(message),
        }
    }
}

impl AnalyticsError {
    /// The single user-facing message for this error.
    ///
    /// Database errors include the engine's message verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(_) => MSG_GENERATION_FAILED.to_string(),
            Self::Unanswerable => MSG_UNANSWERABLE.to_string(),
            Self::UnsafeStatement(_) => MSG_UNSAFE.to_string(),
            Self::Database(message) => format!("{MSG_DATABASE_PREFIX}{message}"),
            Self::QueryTimeout(_) => MSG_QUERY_TIMEOUT.to_string(),
        }
    }

    /// Returns `true` for outcomes that end in the `Rejected` state.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Unanswerable | Self::UnsafeStatement(_))
    }
}

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: question must be a string",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// HTTP-level error enum with status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Access     | 403 Forbidden / 429       |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Requester is not on the allow-list.
    #[error("requester {0} is not allowed")]
    Forbidden(String),

    /// Requester asked again before the throttle interval passed.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the requester may retry.
        retry_after_ms: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Forbidden(_) => 2001,
            Self::RateLimited { .. } => 2002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::RateLimited { retry_after_ms } => Some(format!("retry_after_ms={retry_after_ms}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
