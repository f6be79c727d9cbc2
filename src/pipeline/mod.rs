//! Pure stages of the question → answer pipeline.
//!
//! None of these functions perform I/O: the prompt builder renders the
//! schema contract, the sanitizer cleans model output, and the validator
//! gates statements before they reach the database.

pub mod prompt;
pub mod sanitizer;
pub mod validator;

pub use prompt::{Prompt, build_prompt};
pub use sanitizer::clean;
pub use validator::{Violation, is_safe};
