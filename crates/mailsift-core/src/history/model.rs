//! History data models.

use chrono::{DateTime, Utc};

use crate::category::Category;
use crate::pipeline::{ClassificationResult, Source};
use crate::source::Email;

/// One immutable entry in the classification audit trail.
///
/// Append order is the total order; records are never rewritten. Corrections
/// would be new records.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    /// Storage identifier, `None` until persisted.
    pub id: Option<i64>,
    /// Store-assigned email identifier.
    pub email_id: String,
    /// Stable email fingerprint (see [`Email::fingerprint`]).
    pub fingerprint: String,
    /// Sender address at classification time.
    pub sender: String,
    /// Subject at classification time.
    pub subject: String,
    /// Assigned category.
    pub category: Category,
    /// Decision provenance.
    pub source: Source,
    /// Decision confidence in [0, 1].
    pub confidence: f64,
    /// When the decision was made.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Builds the record for a freshly classified email.
    #[must_use]
    pub fn new(email: &Email, result: &ClassificationResult) -> Self {
        Self {
            id: None,
            email_id: email.id.clone(),
            fingerprint: email.fingerprint(),
            sender: email.sender.clone(),
            subject: email.subject.clone(),
            category: result.category.clone(),
            source: result.source,
            confidence: result.confidence,
            recorded_at: Utc::now(),
        }
    }

    /// The sender's bare address (display name stripped).
    #[must_use]
    pub fn sender_address(&self) -> &str {
        match (self.sender.find('<'), self.sender.rfind('>')) {
            (Some(start), Some(end)) if start < end => self.sender[start + 1..end].trim(),
            _ => self.sender.trim(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_captures_email_and_result() {
        let email = Email::new("42", "a@b.example", "hello", "body", "INBOX");
        let result = ClassificationResult {
            category: Category::new("Work"),
            source: Source::Llm,
            confidence: 0.9,
        };

        let record = HistoryRecord::new(&email, &result);
        assert_eq!(record.email_id, "42");
        assert_eq!(record.fingerprint, email.fingerprint());
        assert_eq!(record.category.as_str(), "Work");
        assert_eq!(record.source, Source::Llm);
    }

    #[test]
    fn test_sender_address_strips_display_name() {
        let email = Email::new("1", "Jane <jane@example.com>", "s", "", "INBOX");
        let result = ClassificationResult {
            category: Category::new("Work"),
            source: Source::Rule,
            confidence: 1.0,
        };
        let record = HistoryRecord::new(&email, &result);
        assert_eq!(record.sender_address(), "jane@example.com");
    }
}
