//! Domain layer: schema contract, per-request values, and requester access.
//!
//! This module holds the fixed two-table schema the gateway can answer
//! questions about, the transient values one question produces
//! ([`GeneratedStatement`], [`AnswerResult`]), and the allow-list /
//! throttle guard applied to requesters.

pub mod answer;
pub mod requester;
pub mod schema;
pub mod statement;

pub use answer::{AnswerResult, PipelineStage};
pub use requester::{AccessGuard, Admission, RequesterId};
pub use schema::{SchemaContract, UNANSWERABLE_SENTINEL, VIDEO_ANALYTICS};
pub use statement::{GeneratedStatement, SanitizedOutput};
