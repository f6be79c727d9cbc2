//! Prompt builder: renders the schema contract and a question into one
//! instruction payload.
//!
//! Rendering is a pure [`fmt::Display`] walk over `'static` contract data,
//! so identical inputs always produce byte-identical payloads.

use std::fmt;

use crate::domain::SchemaContract;

/// Opaque instruction payload handed to the LLM client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Returns the full payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the model payload for `question` under `contract`.
///
/// Surrounding whitespace of the question is trimmed; nothing else about
/// it is altered.
#[must_use]
pub fn build_prompt(contract: &SchemaContract, question: &str) -> Prompt {
    Prompt(
        Rendered {
            contract,
            question: question.trim(),
        }
        .to_string(),
    )
}

struct Rendered<'a> {
    contract: &'a SchemaContract,
    question: &'a str,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.contract;

        writeln!(
            f,
            "You are a precise SQL query generator for a {} video analytics database.",
            c.dialect
        )?;
        writeln!(f)?;
        writeln!(f, "DATABASE SCHEMA:")?;
        for table in c.tables {
            writeln!(f)?;
            writeln!(f, "Table: {} ({})", table.name, table.description)?;
            for col in table.columns {
                writeln!(f, "- {}: {} - {}", col.name, col.sql_type, col.description)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "CRITICAL RULES:")?;
        let mut rule_no = 0usize;
        for routing in c.routing {
            rule_no += 1;
            writeln!(f)?;
            writeln!(f, "{rule_no}. USE {} table when asking about:", routing.table)?;
            for cue in routing.when {
                writeln!(f, "   - {cue}")?;
            }
        }

        rule_no += 1;
        writeln!(f)?;
        writeln!(f, "{rule_no}. Date handling:")?;
        for rule in c.date_rules {
            writeln!(f, "   - {rule}")?;
        }

        rule_no += 1;
        writeln!(f)?;
        writeln!(f, "{rule_no}. Output format:")?;
        for rule in c.output_rules {
            writeln!(f, "   - {rule}")?;
        }

        rule_no += 1;
        writeln!(f)?;
        writeln!(
            f,
            "{rule_no}. IF the question cannot be answered using ONLY the provided schema and rules \
             as a single COUNT, SUM or COUNT(DISTINCT) value, RETURN EXACTLY:"
        )?;
        writeln!(f)?;
        writeln!(f, "   {}", c.sentinel)?;
        writeln!(f)?;
        writeln!(f, "   DO NOT invent metrics.")?;
        writeln!(f, "   DO NOT assume formulas.")?;
        writeln!(f, "   DO NOT explain.")?;

        writeln!(f)?;
        writeln!(f, "EXAMPLES:")?;
        for example in c.examples {
            writeln!(f)?;
            writeln!(f, "Q: {}", example.question)?;
            writeln!(f, "A: {}", example.sql)?;
        }

        writeln!(f)?;
        writeln!(f, "Generate SQL for this question:")?;
        write!(f, "{}", self.question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UNANSWERABLE_SENTINEL, VIDEO_ANALYTICS};

    #[test]
    fn identical_inputs_give_identical_payloads() {
        let a = build_prompt(&VIDEO_ANALYTICS, "Сколько всего видео в системе?");
        let b = build_prompt(&VIDEO_ANALYTICS, "Сколько всего видео в системе?");
        assert_eq!(a.as_str().as_bytes(), b.as_str().as_bytes());
    }

    #[test]
    fn question_is_last_and_trimmed() {
        let prompt = build_prompt(&VIDEO_ANALYTICS, "  Сколько всего лайков?\n");
        assert!(
            prompt
                .as_str()
                .ends_with("Generate SQL for this question:\nСколько всего лайков?")
        );
    }

    #[test]
    fn payload_describes_schema_rules_and_examples() {
        let prompt = build_prompt(&VIDEO_ANALYTICS, "q");
        let text = prompt.as_str();
        assert!(text.contains("Table: videos (final video statistics)"));
        assert!(text.contains("Table: video_snapshots (hourly measurements)"));
        assert!(text.contains("- delta_views_count: INTEGER - Views gained since last snapshot"));
        assert!(text.contains("1. USE videos table when asking about:"));
        assert!(text.contains("2. USE video_snapshots table when asking about:"));
        assert!(text.contains("3. Date handling:"));
        assert!(text.contains("BETWEEN '2025-11-01' AND '2025-11-05'"));
        assert!(text.contains("4. Output format:"));
        assert!(text.contains(UNANSWERABLE_SENTINEL));
        assert!(text.contains("A: SELECT COUNT(*) FROM videos\n"));
    }

    #[test]
    fn different_questions_differ_only_in_tail() {
        let a = build_prompt(&VIDEO_ANALYTICS, "first");
        let b = build_prompt(&VIDEO_ANALYTICS, "second");
        let prefix_a = a.as_str().trim_end_matches("first");
        let prefix_b = b.as_str().trim_end_matches("second");
        assert_eq!(prefix_a, prefix_b);
    }
}
