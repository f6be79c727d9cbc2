//! The fixed two-table schema contract.
//!
//! [`SchemaContract`] describes the analytical store the gateway reads
//! from: the `videos` table with final counters and the hourly
//! `video_snapshots` time series with delta counters. It also carries the
//! routing rules, date rules, output rules, and worked examples that the
//! prompt builder renders into the model instructions.
//!
//! Every piece of the contract is `'static` data so two renders of the
//! same contract are byte-identical.

/// Phrase the model must return when a question cannot be reduced to a
/// single scalar aggregate over this schema.
pub const UNANSWERABLE_SENTINEL: &str = "idk man, i dont have that";

/// A single column in a [`TableSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name as it appears in SQL.
    pub name: &'static str,
    /// PostgreSQL type.
    pub sql_type: &'static str,
    /// Short meaning of the column.
    pub description: &'static str,
}

/// A table in the analytical store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: &'static str,
    /// What a row of this table represents.
    pub description: &'static str,
    /// Ordered column list.
    pub columns: &'static [ColumnSpec],
}

/// Which table a class of questions should be answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingRule {
    /// Table the rule routes to.
    pub table: &'static str,
    /// Question traits (with source-language cue words) that select the table.
    pub when: &'static [&'static str],
}

/// A worked question → query pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedExample {
    /// Question in the source language.
    pub question: &'static str,
    /// The expected single-line statement.
    pub sql: &'static str,
}

/// The complete contract rendered into every model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaContract {
    /// SQL dialect the model must target.
    pub dialect: &'static str,
    /// Tables in declaration order.
    pub tables: &'static [TableSpec],
    /// Table selection rules.
    pub routing: &'static [RoutingRule],
    /// Date normalization rules.
    pub date_rules: &'static [&'static str],
    /// Output format rules.
    pub output_rules: &'static [&'static str],
    /// Phrase signalling that the question is unanswerable.
    pub sentinel: &'static str,
    /// Worked examples.
    pub examples: &'static [WorkedExample],
}

const VIDEO_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "id",
        sql_type: "VARCHAR(36)",
        description: "Video ID (UUID with dashes)",
    },
    ColumnSpec {
        name: "creator_id",
        sql_type: "VARCHAR(32)",
        description: "Creator ID (32-char hex, no dashes)",
    },
    ColumnSpec {
        name: "video_created_at",
        sql_type: "TIMESTAMPTZ",
        description: "When video was published",
    },
    ColumnSpec {
        name: "views_count",
        sql_type: "INTEGER",
        description: "Final total views",
    },
    ColumnSpec {
        name: "likes_count",
        sql_type: "INTEGER",
        description: "Final total likes",
    },
    ColumnSpec {
        name: "comments_count",
        sql_type: "INTEGER",
        description: "Final total comments",
    },
    ColumnSpec {
        name: "reports_count",
        sql_type: "INTEGER",
        description: "Final total reports",
    },
    ColumnSpec {
        name: "created_at",
        sql_type: "TIMESTAMPTZ",
        description: "Record created",
    },
    ColumnSpec {
        name: "updated_at",
        sql_type: "TIMESTAMPTZ",
        description: "Record updated",
    },
];

const SNAPSHOT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "id",
        sql_type: "VARCHAR(32)",
        description: "Snapshot ID",
    },
    ColumnSpec {
        name: "video_id",
        sql_type: "VARCHAR(36)",
        description: "FK to videos.id",
    },
    ColumnSpec {
        name: "views_count",
        sql_type: "INTEGER",
        description: "Views at snapshot time",
    },
    ColumnSpec {
        name: "likes_count",
        sql_type: "INTEGER",
        description: "Likes at snapshot time",
    },
    ColumnSpec {
        name: "comments_count",
        sql_type: "INTEGER",
        description: "Comments at snapshot time",
    },
    ColumnSpec {
        name: "reports_count",
        sql_type: "INTEGER",
        description: "Reports at snapshot time",
    },
    ColumnSpec {
        name: "delta_views_count",
        sql_type: "INTEGER",
        description: "Views gained since last snapshot",
    },
    ColumnSpec {
        name: "delta_likes_count",
        sql_type: "INTEGER",
        description: "Likes gained since last snapshot",
    },
    ColumnSpec {
        name: "delta_comments_count",
        sql_type: "INTEGER",
        description: "Comments gained since last snapshot",
    },
    ColumnSpec {
        name: "delta_reports_count",
        sql_type: "INTEGER",
        description: "Reports gained since last snapshot",
    },
    ColumnSpec {
        name: "created_at",
        sql_type: "TIMESTAMPTZ",
        description: "Snapshot timestamp (hourly)",
    },
    ColumnSpec {
        name: "updated_at",
        sql_type: "TIMESTAMPTZ",
        description: "Record updated",
    },
];

/// Name of the current-totals table.
pub const VIDEOS_TABLE: &str = "videos";

/// Name of the hourly time-series table.
pub const SNAPSHOTS_TABLE: &str = "video_snapshots";

const TABLES: &[TableSpec] = &[
    TableSpec {
        name: VIDEOS_TABLE,
        description: "final video statistics",
        columns: VIDEO_COLUMNS,
    },
    TableSpec {
        name: SNAPSHOTS_TABLE,
        description: "hourly measurements",
        columns: SNAPSHOT_COLUMNS,
    },
];

const ROUTING: &[RoutingRule] = &[
    RoutingRule {
        table: VIDEOS_TABLE,
        when: &[
            "Total/final counts (всего, итого, финальное количество)",
            "Video publication dates (вышло, опубликовано, выпущено)",
            "Filtering by creator_id",
            "Counting videos by criteria",
            "Questions about views_count, likes_count without mentioning growth/change",
        ],
    },
    RoutingRule {
        table: SNAPSHOTS_TABLE,
        when: &[
            "Growth/increase/change on specific date (прирост, выросло, изменение, набрало за день)",
            "Activity on specific date (получали просмотры, были активны)",
            "Use delta_* columns for growth metrics",
            "Use COUNT(*) of rows for questions about how many measurements were taken",
            "Filter by created_at::date for specific dates",
        ],
    },
];

const DATE_RULES: &[&str] = &[
    "Convert Russian dates to YYYY-MM-DD format",
    "\"28 ноября 2025\" -> '2025-11-28'",
    "\"с 1 по 5 ноября 2025\" -> BETWEEN '2025-11-01' AND '2025-11-05'",
    "\"с 1 ноября 2025 по 5 ноября 2025 включительно\" -> BETWEEN '2025-11-01' AND '2025-11-05'",
    "Use created_at::date for date comparisons on TIMESTAMP columns",
];

const OUTPUT_RULES: &[&str] = &[
    "Return ONLY valid PostgreSQL SQL query on a single line",
    "Query MUST return exactly ONE numeric value",
    "Use COUNT(), SUM(), COUNT(DISTINCT) as needed",
    "Use COALESCE(SUM(...), 0) to return 0 instead of NULL",
    "NO markdown, NO explanations, NO comments, NO backticks",
];

const EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "Сколько всего видео есть в системе?",
        sql: "SELECT COUNT(*) FROM videos",
    },
    WorkedExample {
        question: "Сколько видео у креатора с id 'abc123def456' вышло с 1 ноября 2025 по 5 ноября 2025 включительно?",
        sql: "SELECT COUNT(*) FROM videos WHERE creator_id = 'abc123def456' AND video_created_at::date BETWEEN '2025-11-01' AND '2025-11-05'",
    },
    WorkedExample {
        question: "Сколько видео набрало больше 100000 просмотров за всё время?",
        sql: "SELECT COUNT(*) FROM videos WHERE views_count > 100000",
    },
    WorkedExample {
        question: "На сколько просмотров в сумме выросли все видео 28 ноября 2025?",
        sql: "SELECT COALESCE(SUM(delta_views_count), 0) FROM video_snapshots WHERE created_at::date = '2025-11-28'",
    },
    WorkedExample {
        question: "Сколько разных видео получали новые просмотры 27 ноября 2025?",
        sql: "SELECT COUNT(DISTINCT video_id) FROM video_snapshots WHERE created_at::date = '2025-11-27' AND delta_views_count > 0",
    },
    WorkedExample {
        question: "Сколько всего лайков у всех видео?",
        sql: "SELECT COALESCE(SUM(likes_count), 0) FROM videos",
    },
    WorkedExample {
        question: "Сколько видео вышло в ноябре 2025?",
        sql: "SELECT COUNT(*) FROM videos WHERE video_created_at::date BETWEEN '2025-11-01' AND '2025-11-30'",
    },
];

/// The one contract this gateway supports.
pub const VIDEO_ANALYTICS: SchemaContract = SchemaContract {
    dialect: "PostgreSQL",
    tables: TABLES,
    routing: ROUTING,
    date_rules: DATE_RULES,
    output_rules: OUTPUT_RULES,
    sentinel: UNANSWERABLE_SENTINEL,
    examples: EXAMPLES,
};

impl Default for SchemaContract {
    fn default() -> Self {
        VIDEO_ANALYTICS
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn contract_has_both_tables() {
        let names: Vec<_> = SchemaContract::default()
            .tables
            .iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, [VIDEOS_TABLE, SNAPSHOTS_TABLE]);
    }

    #[test]
    fn snapshots_expose_all_delta_columns() {
        let Some(table) = VIDEO_ANALYTICS
            .tables
            .iter()
            .find(|t| t.name == SNAPSHOTS_TABLE)
        else {
            panic!("snapshots table missing");
        };
        let deltas: Vec<_> = table
            .columns
            .iter()
            .filter(|c| c.name.starts_with("delta_"))
            .map(|c| c.name)
            .collect();
        assert_eq!(
            deltas,
            [
                "delta_views_count",
                "delta_likes_count",
                "delta_comments_count",
                "delta_reports_count"
            ]
        );
    }

    #[test]
    fn routing_covers_every_table() {
        for table in VIDEO_ANALYTICS.tables {
            assert!(
                VIDEO_ANALYTICS.routing.iter().any(|r| r.table == table.name),
                "no routing rule for {}",
                table.name
            );
        }
    }

    #[test]
    fn worked_examples_are_single_line_aggregates() {
        for example in VIDEO_ANALYTICS.examples {
            assert!(!example.sql.contains('\n'));
            let upper = example.sql.to_uppercase();
            assert!(upper.starts_with("SELECT"));
            assert!(upper.contains("COUNT(") || upper.contains("SUM("));
        }
    }
}
