//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed. Fatal for history appends: losing audit
    /// continuity would corrupt the rule suggester's support counts.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The language-model classifier failed for one email. Skippable: the
    /// batch continues with the next email.
    #[error("Classifier error: {0}")]
    Classifier(#[from] crate::classifier::ClassifierError),

    /// A rule definition could not be evaluated.
    #[error("Rule error: {0}")]
    Rule(#[from] crate::rules::RuleError),

    /// Mail store operation failed.
    #[error("Mail store error: {0}")]
    Mail(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a batch run may continue past this error with the next email.
    ///
    /// Classifier failures affect a single email; everything else (history
    /// writes in particular) is fatal to the run.
    #[must_use]
    pub const fn is_per_email(&self) -> bool {
        matches!(self, Self::Classifier(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
