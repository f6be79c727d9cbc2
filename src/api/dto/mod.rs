//! Data Transfer Objects for REST request/response serialization.

pub mod answer_dto;

pub use answer_dto::*;
