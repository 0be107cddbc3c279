//! The two-step classification pipeline: rules first, language model second.

use tracing::{debug, info};

use crate::category::{Category, CategorySet};
use crate::classifier::{ChatEndpoint, LanguageClassifier, PromptStyle};
use crate::error::Result;
use crate::history::{HistoryRecord, HistoryRepository};
use crate::rules::RuleMatcher;
use crate::source::Email;

/// Provenance of a classification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// A deterministic rule matched.
    Rule,
    /// The language model decided.
    #[default]
    Llm,
}

impl Source {
    /// Parse from storage string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rule" => Self::Rule,
            _ => Self::Llm,
        }
    }

    /// Convert to storage string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Llm => "llm",
        }
    }
}

/// The outcome of classifying one email.
///
/// Produced exactly once per email per pipeline invocation; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Assigned category, or the `unclassified` sentinel.
    pub category: Category,
    /// Decision provenance.
    pub source: Source,
    /// Confidence in [0, 1]: 1.0 for rule matches, approximate for the model.
    pub confidence: f64,
}

/// Orchestrates rule matching, language-model fallback and history recording.
///
/// The ordering is a cost optimization: the model is only consulted for
/// emails no existing rule explains. Every successful classification appends
/// exactly one history record before returning.
pub struct ClassificationPipeline<E> {
    matcher: RuleMatcher,
    classifier: LanguageClassifier<E>,
    history: HistoryRepository,
    categories: CategorySet,
}

impl<E: ChatEndpoint> ClassificationPipeline<E> {
    /// Assembles a pipeline from its two capability objects and the history.
    #[must_use]
    pub const fn new(
        matcher: RuleMatcher,
        classifier: LanguageClassifier<E>,
        history: HistoryRepository,
        categories: CategorySet,
    ) -> Self {
        Self {
            matcher,
            classifier,
            history,
            categories,
        }
    }

    /// Classifies one email, recording the decision in history.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Classifier`] when the model call fails (per-email,
    /// batch may continue); [`crate::Error::Database`] when the history
    /// append fails (fatal to the run).
    pub async fn classify(&self, email: &Email) -> Result<ClassificationResult> {
        self.classify_with_prompt(email, PromptStyle::Standard).await
    }

    /// Classifies one email with an explicit prompt style.
    ///
    /// Spam-folder review uses [`PromptStyle::SpamReview`]; the rule step is
    /// identical in both styles.
    ///
    /// # Errors
    ///
    /// Same as [`Self::classify`].
    pub async fn classify_with_prompt(
        &self,
        email: &Email,
        style: PromptStyle,
    ) -> Result<ClassificationResult> {
        let result = if let Some(rule) = self.matcher.first_match(email) {
            ClassificationResult {
                category: rule.category.clone(),
                source: Source::Rule,
                confidence: 1.0,
            }
        } else {
            debug!(email_id = %email.id, "no rule matched, consulting model");
            self.classifier
                .classify(email, &self.categories, style)
                .await?
        };

        self.history
            .append(&HistoryRecord::new(email, &result))
            .await?;

        info!(
            email_id = %email.id,
            category = %result.category,
            source = result.source.as_str(),
            confidence = result.confidence,
            "classified email"
        );
        Ok(result)
    }

    /// Whether this email was already classified in an earlier run.
    ///
    /// # Errors
    ///
    /// Returns an error if the history lookup fails.
    pub async fn already_classified(&self, email: &Email) -> Result<bool> {
        self.history.contains_fingerprint(&email.fingerprint()).await
    }

    /// The active category set.
    #[must_use]
    pub const fn categories(&self) -> &CategorySet {
        &self.categories
    }
}
