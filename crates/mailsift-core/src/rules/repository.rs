//! Rule repository for persistent storage of the ordered rule set.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::warn;

use super::model::{MatchKind, Rule, RuleField};
use crate::Result;
use crate::category::Category;

/// Repository for the ordered, persistent rule set.
///
/// Rules carry an explicit `position`; evaluation order is position order and
/// new rules always append at the end, so accepted suggestions never reorder
/// existing precedence.
#[derive(Clone)]
pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position INTEGER NOT NULL,
                field TEXT NOT NULL,
                match_kind TEXT NOT NULL,
                pattern TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(field, match_kind, pattern)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_rules_position ON rules(position)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load all rules in evaluation order.
    ///
    /// Rows with an unknown field or match type, or an invalid pattern, are
    /// skipped with a warning; the remainder of the set still loads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load(&self) -> Result<Vec<Rule>> {
        let rows = sqlx::query(
            r"
            SELECT id, field, match_kind, pattern, category
            FROM rules
            ORDER BY position, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.get("id");
            let field: String = row.get("field");
            let kind: String = row.get("match_kind");
            let pattern: String = row.get("pattern");
            let category: String = row.get("category");

            let parsed = RuleField::parse(&field)
                .and_then(|f| MatchKind::parse(&kind).map(|k| (f, k)))
                .and_then(|(f, k)| Rule::new(f, k, &pattern, Category::new(category)));
            match parsed {
                Ok(mut rule) => {
                    rule.id = Some(id);
                    rules.push(rule);
                }
                Err(e) => warn!(rule_id = id, "skipping malformed rule: {e}"),
            }
        }
        Ok(rules)
    }

    /// Append a rule at the end of the evaluation order.
    ///
    /// The pattern is compiled first, so a malformed rule is rejected before
    /// it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the insert fails
    /// (including a duplicate field/match-type/pattern row).
    pub async fn append(
        &self,
        field: RuleField,
        kind: MatchKind,
        pattern: &str,
        category: &Category,
    ) -> Result<Rule> {
        let mut rule = Rule::new(field, kind, pattern, category.clone())?;

        let result = sqlx::query(
            r"
            INSERT INTO rules (position, field, match_kind, pattern, category)
            VALUES ((SELECT COALESCE(MAX(position), 0) + 1 FROM rules), ?, ?, ?, ?)
            ",
        )
        .bind(field.as_str())
        .bind(kind.as_str())
        .bind(pattern)
        .bind(category.as_str())
        .execute(&self.pool)
        .await?;

        rule.id = Some(result.last_insert_rowid());
        Ok(rule)
    }

    /// Whether a rule with this field and pattern already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists(&self, field: RuleField, pattern: &str) -> Result<bool> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM rules
            WHERE field = ? AND LOWER(pattern) = LOWER(?)
            ",
        )
        .bind(field.as_str())
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    /// Number of stored rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM rules")
            .fetch_one(&self.pool)
            .await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(row.get::<i64, _>("n") as u32)
    }
}
