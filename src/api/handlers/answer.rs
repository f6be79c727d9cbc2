//! Question answering endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AnswerRequest, AnswerResponse};
use crate::app_state::AppState;
use crate::domain::{Admission, RequesterId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /answer`: Answer a natural-language question with one number.
///
/// Pipeline failures (unanswerable question, refused statement, model or
/// database errors) are not HTTP errors: they come back as `200` with the
/// `error` field set. A blank question produces `204` and nothing else.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed body, a requester outside the
/// allow-list, or a throttled requester.
#[utoipa::path(
    post,
    path = "/api/v1/answer",
    tag = "Analytics",
    summary = "Answer a question",
    description = "Translates a Russian question about video statistics into a single read-only aggregate query, runs it, and returns the scalar result.",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Question processed", body = AnswerResponse),
        (status = 204, description = "Blank question, nothing to answer"),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 403, description = "Requester not allowed", body = ErrorResponse),
        (status = 429, description = "Requester throttled", body = ErrorResponse),
    )
)]
pub async fn answer(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(req) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let requester = RequesterId::new(req.requester.as_deref().unwrap_or_default());

    match state.access_guard.admit(&requester).await {
        Admission::Allowed => {}
        Admission::Forbidden => {
            tracing::warn!(%requester, "requester not on allow-list");
            return Err(GatewayError::Forbidden(requester.to_string()));
        }
        Admission::Throttled { retry_after } => {
            return Err(GatewayError::RateLimited {
                retry_after_ms: u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
            });
        }
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, %requester, "question received");
    tracing::debug!(%request_id, question = %req.question);

    let Some(result) = state.analytics_service.answer(&req.question).await else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    tracing::info!(%request_id, answered = result.is_answered(), stage = %result.stage, "question processed");

    Ok(Json(AnswerResponse::new(request_id, result)).into_response())
}

/// Analytics routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/answer", post(answer))
}
