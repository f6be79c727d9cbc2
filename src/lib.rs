//! # video-analytics-gateway
//!
//! Answers natural-language (Russian) questions about video statistics with
//! a single number.
//!
//! A question is turned into a prompt describing a fixed two-table schema,
//! sent to a text-generation model, and the model's reply is cleaned into a
//! single SQL statement. The statement only reaches the database after it
//! passes a read-only aggregate safety gate; the scalar result goes back to
//! the caller.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + AccessGuard (api/, domain/)
//!     │
//!     ├── AnalyticsService (service/)
//!     │       │
//!     │       ├── build_prompt ─▶ TextGenerator (llm/)
//!     │       ├── clean ─▶ is_safe (pipeline/)
//!     │       └── QueryExecutor (persistence/)
//!     │
//!     └── PostgreSQL (read-only)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod persistence;
pub mod pipeline;
pub mod service;
