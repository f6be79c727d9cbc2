//! SQL sanitizer: turns raw model text into one bare statement.

use crate::domain::{GeneratedStatement, SanitizedOutput};

/// Lowercased marker identifying the unanswerable sentinel, even when the
/// model wraps it in quotes or a `return:` prefix.
const SENTINEL_MARKER: &str = "idk man";

const FENCE: &str = "```";

/// Language tags recognized after an opening fence.
const INLINE_TAGS: &[&str] = &["sql", "postgresql", "postgres", "pgsql", "psql"];

/// Cleans raw model output.
///
/// - Any mention of the sentinel yields [`SanitizedOutput::Unanswerable`].
/// - A code fence, with or without a language tag, is removed.
/// - Only the first non-empty line is kept.
/// - The result ends with exactly one `;`.
#[must_use]
pub fn clean(raw: &str) -> SanitizedOutput {
    if raw.to_lowercase().contains(SENTINEL_MARKER) {
        return SanitizedOutput::Unanswerable;
    }

    let body = strip_fence(raw.trim());
    let Some(first_line) = body.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return SanitizedOutput::Empty;
    };

    let statement = first_line.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if statement.is_empty() {
        return SanitizedOutput::Empty;
    }

    SanitizedOutput::Statement(GeneratedStatement::new(format!("{statement};")))
}

fn strip_fence(text: &str) -> &str {
    let body = match text.strip_prefix(FENCE) {
        Some(rest) => match rest.split_once('\n') {
            Some((tag, after)) if is_language_tag(tag) => after,
            _ => strip_inline_tag(rest),
        },
        None => text,
    };
    let body = body.trim_end();
    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

/// An empty line or a known tag; anything else is statement text.
fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || INLINE_TAGS.iter().any(|tag| line.eq_ignore_ascii_case(tag))
}

fn strip_inline_tag(rest: &str) -> &str {
    for tag in INLINE_TAGS {
        if let Some(head) = rest.get(..tag.len())
            && head.eq_ignore_ascii_case(tag)
            && let Some(after) = rest.get(tag.len()..)
            && after.starts_with(char::is_whitespace)
        {
            return after;
        }
    }
    rest
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn stmt(raw: &str) -> String {
        let SanitizedOutput::Statement(s) = clean(raw) else {
            panic!("expected statement for {raw:?}");
        };
        s.as_str().to_string()
    }

    #[test]
    fn bare_statement_gets_terminator() {
        assert_eq!(stmt("SELECT COUNT(*) FROM videos"), "SELECT COUNT(*) FROM videos;");
    }

    #[test]
    fn existing_terminators_collapse_to_one() {
        assert_eq!(stmt("SELECT COUNT(*) FROM videos;;  "), "SELECT COUNT(*) FROM videos;");
        assert_eq!(stmt("SELECT COUNT(*) FROM videos ;"), "SELECT COUNT(*) FROM videos;");
    }

    #[test]
    fn fenced_output_matches_unwrapped() {
        let plain = "SELECT COALESCE(SUM(delta_views_count), 0) FROM video_snapshots";
        let expected = stmt(plain);
        let wrapped = [
            format!("```sql\n{plain}\n```"),
            format!("```SQL\n{plain}\n```"),
            format!("```\n{plain}\n```"),
            format!("```sql {plain}```"),
            format!("```{plain}```"),
            format!("  ```postgresql\n{plain};\n```\n"),
        ];
        for raw in &wrapped {
            assert_eq!(stmt(raw), expected, "input: {raw:?}");
        }
    }

    #[test]
    fn statement_keyword_after_fence_is_not_a_tag() {
        assert_eq!(stmt("```SELECT\nCOUNT(*) FROM videos\n```"), "SELECT;");
        assert_eq!(stmt("```with\nx AS (SELECT 1) SELECT COUNT(*) FROM x```"), "with;");
        assert_eq!(
            stmt("```PgSQL\nSELECT COUNT(*) FROM videos\n```"),
            "SELECT COUNT(*) FROM videos;"
        );
    }

    #[test]
    fn only_first_line_survives() {
        let raw = "SELECT COUNT(*) FROM videos\nWHERE views_count > 10";
        assert_eq!(stmt(raw), "SELECT COUNT(*) FROM videos;");
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        assert_eq!(stmt("```sql\n\n  SELECT 1\n```"), "SELECT 1;");
    }

    #[test]
    fn sentinel_is_detected_in_any_casing_or_wrapping() {
        for raw in [
            "idk man, i dont have that",
            "IDK MAN, I DONT HAVE THAT",
            "return: \"idk man, i dont have that\"",
            "```\nidk man, i dont have that\n```",
        ] {
            assert_eq!(clean(raw), SanitizedOutput::Unanswerable, "input: {raw:?}");
        }
    }

    #[test]
    fn empty_generation_is_empty() {
        assert_eq!(clean(""), SanitizedOutput::Empty);
        assert_eq!(clean("```sql\n```"), SanitizedOutput::Empty);
        assert_eq!(clean(" ; "), SanitizedOutput::Empty);
    }
}
