//! Safety gate: a conservative lexical check that only lets a single
//! read-only scalar aggregate through.
//!
//! This is not a parser. The statement is split into words (runs of
//! letters, digits and `_`) and checked against a denylist, so a
//! denylisted word is rejected wherever it appears, including inside
//! string literals. Column names such as `created_at` or `updated_at`
//! are distinct words and pass. Statements that pass may still fail at
//! execution (unknown column, bad cast); the executor reports those.

/// Words that indicate mutation, schema change, privilege change, or
/// procedural execution.
const DENYLIST: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "MERGE", "EXEC", "EXECUTE", "COPY", "CALL",
];

/// Functions whose presence shows the statement reduces to one scalar.
const AGGREGATES: &[&str] = &["COUNT", "SUM"];

/// Why a statement was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Does not start with `SELECT` or `WITH`.
    NotReadOnly,
    /// Contains a denylisted word.
    ForbiddenKeyword(&'static str),
    /// Uses the `SELECT ... INTO` idiom.
    SelectInto,
    /// More than one statement.
    MultipleStatements,
    /// No `COUNT(` / `SUM(` aggregate.
    NotScalarAggregate,
}

/// Returns `true` if `statement` passes the safety gate.
#[must_use]
pub fn is_safe(statement: &str) -> bool {
    check(statement).is_ok()
}

/// Runs the safety gate, reporting the first violation found.
///
/// # Errors
///
/// Returns the [`Violation`] that caused the rejection.
pub fn check(statement: &str) -> Result<(), Violation> {
    let upper = statement.trim().to_uppercase();

    if !(upper.starts_with("SELECT") || upper.starts_with("WITH")) {
        return Err(Violation::NotReadOnly);
    }

    let body = upper.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if body.contains(';') {
        return Err(Violation::MultipleStatements);
    }

    let words = words(&upper);

    if let Some(keyword) = words
        .iter()
        .find_map(|(w, _)| DENYLIST.iter().copied().find(|d| d == w))
    {
        return Err(Violation::ForbiddenKeyword(keyword));
    }

    let mut seen_select = false;
    for (word, _) in &words {
        match *word {
            "SELECT" => seen_select = true,
            "INTO" if seen_select => return Err(Violation::SelectInto),
            _ => {}
        }
    }

    let has_aggregate = words.iter().any(|(word, end)| {
        AGGREGATES.contains(word)
            && upper
                .get(*end..)
                .is_some_and(|rest| rest.trim_start().starts_with('('))
    });
    if !has_aggregate {
        return Err(Violation::NotScalarAggregate);
    }

    Ok(())
}

/// Splits `text` into words, returning each with its end byte offset.
fn words(text: &str) -> Vec<(&str, usize)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        let is_word = c.is_alphanumeric() || c == '_';
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if let Some(w) = text.get(s..i) {
                    out.push((w, i));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start
        && let Some(w) = text.get(s..)
    {
        out.push((w, text.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_worked_examples() {
        for example in crate::domain::VIDEO_ANALYTICS.examples {
            let sql = format!("{};", example.sql);
            assert_eq!(check(&sql), Ok(()), "rejected: {sql}");
        }
    }

    #[test]
    fn accepts_cte_and_spaced_aggregate() {
        assert!(is_safe(
            "WITH d AS (SELECT video_id FROM video_snapshots) SELECT COUNT (DISTINCT video_id) FROM d;"
        ));
        assert!(is_safe("  select sum(likes_count) from videos"));
    }

    #[test]
    fn rejects_every_denylisted_word_in_any_casing() {
        for keyword in DENYLIST {
            for variant in [
                keyword.to_string(),
                keyword.to_lowercase(),
                capitalize(keyword),
            ] {
                let sql = format!("SELECT COUNT(*) FROM videos; {variant} TABLE videos;");
                assert!(!is_safe(&sql), "accepted: {sql}");
                let inline = format!("SELECT COUNT(*) FROM videos WHERE creator_id = '{variant}';");
                assert_eq!(
                    check(&inline),
                    Err(Violation::ForbiddenKeyword(*keyword)),
                    "input: {inline}"
                );
            }
        }
    }

    #[test]
    fn rejects_select_into() {
        assert_eq!(
            check("SELECT COUNT(*) INTO backup FROM videos;"),
            Err(Violation::SelectInto)
        );
        assert!(!is_safe("select count(*) into t from videos"));
    }

    #[test]
    fn rejects_anything_not_starting_with_select_or_with() {
        for sql in [
            "DROP TABLE videos;",
            "EXPLAIN SELECT COUNT(*) FROM videos;",
            "-- SELECT\nSELECT COUNT(*) FROM videos;",
            "(SELECT COUNT(*) FROM videos);",
            "",
        ] {
            assert_eq!(check(sql), Err(Violation::NotReadOnly), "input: {sql:?}");
        }
    }

    #[test]
    fn rejects_statements_without_aggregate() {
        assert_eq!(
            check("SELECT id FROM videos;"),
            Err(Violation::NotScalarAggregate)
        );
        assert_eq!(
            check("SELECT discount FROM videos;"),
            Err(Violation::NotScalarAggregate)
        );
        assert_eq!(
            check("SELECT max(views_count) FROM videos;"),
            Err(Violation::NotScalarAggregate)
        );
    }

    #[test]
    fn rejects_stacked_statements() {
        assert_eq!(
            check("SELECT COUNT(*) FROM videos; SELECT COUNT(*) FROM video_snapshots;"),
            Err(Violation::MultipleStatements)
        );
    }

    #[test]
    fn identifiers_containing_denylisted_fragments_pass() {
        assert!(is_safe(
            "SELECT COUNT(*) FROM videos WHERE created_at > updated_at;"
        ));
    }

    fn capitalize(word: &str) -> String {
        let mut chars = word.chars();
        chars
            .next()
            .map(|c| c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
            .unwrap_or_default()
    }
}
