//! Per-request SQL text produced from a model generation.

use std::fmt;

/// Sanitized SQL produced for a single question.
///
/// Lives for one request only: it is never persisted and never reused
/// for another question. Always terminated by exactly one `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement(String);

impl GeneratedStatement {
    /// Wraps already-sanitized SQL text.
    #[must_use]
    pub(crate) fn new(sql: String) -> Self {
        Self(sql)
    }

    /// Returns the statement text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GeneratedStatement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of sanitizing raw model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizedOutput {
    /// A single statement ready for the safety gate.
    Statement(GeneratedStatement),
    /// The model declined with the sentinel phrase.
    Unanswerable,
    /// Nothing usable was left after cleaning.
    Empty,
}
