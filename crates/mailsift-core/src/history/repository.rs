//! Append-only history repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::model::HistoryRecord;
use crate::Result;
use crate::category::Category;
use crate::pipeline::Source;

/// Repository for the append-only classification history.
///
/// Prior records are never updated; the log doubles as the audit trail and
/// as the mining input for rule suggestion, so append order must stay a
/// valid total order even across aborted runs.
#[derive(Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
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
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                sender TEXT NOT NULL,
                subject TEXT NOT NULL,
                category TEXT NOT NULL,
                source TEXT NOT NULL,
                confidence REAL NOT NULL,
                recorded_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_history_fingerprint ON history(fingerprint)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_history_source ON history(source)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one record. Each append is a single atomic insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails. Callers treat this as fatal to
    /// the run: a gap in the audit trail would corrupt suggestion counts.
    pub async fn append(&self, record: &HistoryRecord) -> Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO history
                (email_id, fingerprint, sender, subject, category, source, confidence, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&record.email_id)
        .bind(&record.fingerprint)
        .bind(&record.sender)
        .bind(&record.subject)
        .bind(record.category.as_str())
        .bind(record.source.as_str())
        .bind(record.confidence)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Whether an email with this fingerprint was already classified.
    ///
    /// Records carrying the `unclassified` sentinel do not count, so those
    /// emails are retried on the next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM history WHERE fingerprint = ? AND category != ?",
        )
        .bind(fingerprint)
        .bind(crate::category::UNCLASSIFIED)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    /// The most recent language-model decisions, in append order.
    ///
    /// This is the mining input for rule suggestion: rule-sourced records
    /// carry no new signal (a rule already explains them).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn llm_records(&self, limit: u32) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, email_id, fingerprint, sender, subject, category, source,
                   confidence, recorded_at
            FROM history
            WHERE source = 'llm'
            ORDER BY id DESC
            LIMIT ?
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records: Vec<_> = rows.iter().map(row_to_record).collect();
        records.reverse();
        Ok(records)
    }

    /// The most recent records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, email_id, fingerprint, sender, subject, category, source,
                   confidence, recorded_at
            FROM history
            ORDER BY id DESC
            LIMIT ?
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM history")
            .fetch_one(&self.pool)
            .await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(row.get::<i64, _>("n") as u32)
    }

    /// Delete the entire history.
    ///
    /// Operator reset, not a correction path; normal operation only appends.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM history").execute(&self.pool).await?;
        Ok(())
    }
}

/// Convert a database row to a `HistoryRecord`.
fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> HistoryRecord {
    let recorded_at: String = row.get("recorded_at");
    HistoryRecord {
        id: Some(row.get("id")),
        email_id: row.get("email_id"),
        fingerprint: row.get("fingerprint"),
        sender: row.get("sender"),
        subject: row.get("subject"),
        category: Category::new(row.get::<String, _>("category")),
        source: Source::parse(row.get("source")),
        confidence: row.get("confidence"),
        recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
            .map_or(DateTime::<Utc>::UNIX_EPOCH, |t| t.with_timezone(&Utc)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::ClassificationResult;
    use crate::source::Email;

    fn record(id: &str, sender: &str, category: &str, source: Source) -> HistoryRecord {
        let email = Email::new(id, sender, "subject", "body", "INBOX");
        HistoryRecord::new(
            &email,
            &ClassificationResult {
                category: Category::new(category),
                source,
                confidence: if source == Source::Rule { 1.0 } else { 0.9 },
            },
        )
    }

    #[tokio::test]
    async fn test_append_and_fingerprint_lookup() {
        let repo = HistoryRepository::in_memory().await.unwrap();
        let r = record("1", "a@b.example", "Work", Source::Llm);

        repo.append(&r).await.unwrap();

        assert!(repo.contains_fingerprint(&r.fingerprint).await.unwrap());
        assert!(!repo.contains_fingerprint("unknown").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unclassified_records_do_not_block_retry() {
        let repo = HistoryRepository::in_memory().await.unwrap();
        let r = record("1", "a@b.example", crate::category::UNCLASSIFIED, Source::Llm);

        repo.append(&r).await.unwrap();

        assert!(!repo.contains_fingerprint(&r.fingerprint).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_llm_records_filters_rule_decisions_and_keeps_order() {
        let repo = HistoryRepository::in_memory().await.unwrap();

        repo.append(&record("1", "a@b.example", "Work", Source::Llm))
            .await
            .unwrap();
        repo.append(&record("2", "c@d.example", "Finance", Source::Rule))
            .await
            .unwrap();
        repo.append(&record("3", "e@f.example", "Spam", Source::Llm))
            .await
            .unwrap();

        let records = repo.llm_records(100).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].email_id, "1");
        assert_eq!(records[1].email_id, "3");
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_fields() {
        let repo = HistoryRepository::in_memory().await.unwrap();
        let original = record("9", "Jane <jane@acme.example>", "Finance", Source::Llm);

        repo.append(&original).await.unwrap();
        let loaded = &repo.recent(1).await.unwrap()[0];

        assert_eq!(loaded.email_id, original.email_id);
        assert_eq!(loaded.sender, original.sender);
        assert_eq!(loaded.category, original.category);
        assert_eq!(loaded.source, original.source);
        assert!((loaded.confidence - original.confidence).abs() < f64::EPSILON);
        assert_eq!(
            loaded.recorded_at.timestamp(),
            original.recorded_at.timestamp()
        );
    }

    #[tokio::test]
    async fn test_clear_resets_history() {
        let repo = HistoryRepository::in_memory().await.unwrap();
        repo.append(&record("1", "a@b.example", "Work", Source::Llm))
            .await
            .unwrap();

        repo.clear().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
