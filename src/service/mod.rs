//! Service layer: business logic orchestration.
//!
//! [`AnalyticsService`] drives a question through prompt building, model
//! generation, sanitizing, the safety gate, and execution.

pub mod analytics_service;

pub use analytics_service::AnalyticsService;
