//! Spam-folder review: rescue high-confidence false positives.

use tracing::{info, warn};

use crate::classifier::{ChatEndpoint, PromptStyle};
use crate::error::Result;
use crate::pipeline::{ClassificationPipeline, ClassificationResult};
use crate::source::Email;

/// An email the reviewer believes was wrongly spam-filtered.
#[derive(Debug, Clone)]
pub struct RescueCandidate {
    /// The reviewed email.
    pub email: Email,
    /// Its re-classification.
    pub result: ClassificationResult,
}

/// Tally of one review run.
#[derive(Debug, Default)]
pub struct ReviewOutcome {
    /// Emails re-classified as non-spam with confidence at or above the
    /// threshold. The caller (or a dry run) decides whether to move them.
    pub candidates: Vec<RescueCandidate>,
    /// Emails the review confirmed as spam.
    pub confirmed_spam: u32,
    /// Emails re-classified as non-spam but below the confidence threshold;
    /// they stay in the spam folder.
    pub below_threshold: u32,
    /// Per-email classifier failures skipped over.
    pub failures: u32,
}

/// Re-runs the classification pipeline over spam-folder messages.
///
/// Spam folders accumulate false positives; gating rescue on a confidence
/// floor avoids rescuing low-confidence guesses. Rules are still consulted
/// first: a rule that names the spam category confirms spam and
/// short-circuits rescue, while a rule naming any other category rescues at
/// confidence 1.0.
pub struct SpamReviewer<'p, E> {
    pipeline: &'p ClassificationPipeline<E>,
    confidence_threshold: f64,
}

impl<'p, E: ChatEndpoint> SpamReviewer<'p, E> {
    /// Creates a reviewer over an assembled pipeline.
    #[must_use]
    pub const fn new(pipeline: &'p ClassificationPipeline<E>, confidence_threshold: f64) -> Self {
        Self {
            pipeline,
            confidence_threshold,
        }
    }

    /// Reviews spam-folder emails and returns rescue candidates.
    ///
    /// Does not move mail itself. Every reviewed email is recorded in
    /// history through the normal pipeline path.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions (history write failure);
    /// per-email classifier failures are tallied and skipped.
    pub async fn review(&self, spam_emails: &[Email]) -> Result<ReviewOutcome> {
        let spam = self.pipeline.categories().spam();
        let mut outcome = ReviewOutcome::default();

        for email in spam_emails {
            let result = match self
                .pipeline
                .classify_with_prompt(email, PromptStyle::SpamReview)
                .await
            {
                Ok(result) => result,
                Err(e) if e.is_per_email() => {
                    warn!(email_id = %email.id, "review classification failed: {e}");
                    outcome.failures += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if result.category == spam || result.category.is_unclassified() {
                outcome.confirmed_spam += u32::from(result.category == spam);
                continue;
            }

            if result.confidence >= self.confidence_threshold {
                info!(
                    email_id = %email.id,
                    category = %result.category,
                    confidence = result.confidence,
                    "potential false positive"
                );
                outcome.candidates.push(RescueCandidate {
                    email: email.clone(),
                    result,
                });
            } else {
                info!(
                    email_id = %email.id,
                    category = %result.category,
                    confidence = result.confidence,
                    threshold = self.confidence_threshold,
                    "below rescue threshold, keeping in spam folder"
                );
                outcome.below_threshold += 1;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::category::{Category, CategorySet};
    use crate::classifier::{ChatRequest, ClassifierError, LanguageClassifier};
    use crate::history::HistoryRepository;
    use crate::rules::{MatchKind, Rule, RuleField, RuleMatcher};

    /// Replies with a scripted answer per sender address.
    struct PerSenderEndpoint;

    impl ChatEndpoint for PerSenderEndpoint {
        async fn complete(
            &self,
            request: &ChatRequest,
        ) -> std::result::Result<String, ClassifierError> {
            let user = &request.messages[1].content;
            if user.contains("boss@corp.example") {
                Ok("Work (0.9)".to_string())
            } else if user.contains("friend@mail.example") {
                Ok("Personal (0.6)".to_string())
            } else {
                Ok("Spam".to_string())
            }
        }
    }

    fn categories() -> CategorySet {
        CategorySet::new(
            ["Work", "Personal", "Newsletter", "Spam"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            "Spam",
        )
        .unwrap()
    }

    async fn pipeline(rules: Vec<Rule>) -> ClassificationPipeline<PerSenderEndpoint> {
        let categories = categories();
        ClassificationPipeline::new(
            RuleMatcher::new(rules, &categories),
            LanguageClassifier::new(PerSenderEndpoint),
            HistoryRepository::in_memory().await.unwrap(),
            categories,
        )
    }

    fn spam_email(id: &str, sender: &str) -> Email {
        Email::new(id, sender, "subject", "body", "Spam")
    }

    #[tokio::test]
    async fn test_confidence_gating() {
        let pipeline = pipeline(vec![]).await;
        let reviewer = SpamReviewer::new(&pipeline, 0.8);

        let emails = vec![
            spam_email("1", "boss@corp.example"),      // Work 0.9 -> rescued
            spam_email("2", "friend@mail.example"),    // Personal 0.6 -> kept
            spam_email("3", "lottery@scam.example"),   // Spam -> confirmed
        ];
        let outcome = reviewer.review(&emails).await.unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].email.id, "1");
        assert_eq!(outcome.candidates[0].result.category.as_str(), "Work");
        assert_eq!(outcome.below_threshold, 1);
        assert_eq!(outcome.confirmed_spam, 1);
    }

    #[tokio::test]
    async fn test_candidates_never_carry_spam_or_low_confidence() {
        let pipeline = pipeline(vec![]).await;
        let reviewer = SpamReviewer::new(&pipeline, 0.8);

        let emails: Vec<Email> = (0..20)
            .map(|i| {
                let sender = match i % 3 {
                    0 => "boss@corp.example",
                    1 => "friend@mail.example",
                    _ => "lottery@scam.example",
                };
                spam_email(&i.to_string(), sender)
            })
            .collect();
        let outcome = reviewer.review(&emails).await.unwrap();

        let spam = pipeline.categories().spam();
        for candidate in &outcome.candidates {
            assert_ne!(candidate.result.category, spam);
            assert!(candidate.result.confidence >= 0.8);
        }
    }

    #[tokio::test]
    async fn test_spam_rule_short_circuits_rescue() {
        // A rule pinning this sender to Spam must win over the model,
        // which would have said "Work (0.9)".
        let rule = Rule::new(
            RuleField::Sender,
            MatchKind::Substring,
            "boss@corp.example",
            Category::new("Spam"),
        )
        .unwrap();
        let pipeline = pipeline(vec![rule]).await;
        let reviewer = SpamReviewer::new(&pipeline, 0.8);

        let outcome = reviewer
            .review(&[spam_email("1", "boss@corp.example")])
            .await
            .unwrap();

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.confirmed_spam, 1);
    }

    #[tokio::test]
    async fn test_non_spam_rule_rescues_at_full_confidence() {
        let rule = Rule::new(
            RuleField::Sender,
            MatchKind::Substring,
            "friend@mail.example",
            Category::new("Personal"),
        )
        .unwrap();
        let pipeline = pipeline(vec![rule]).await;
        let reviewer = SpamReviewer::new(&pipeline, 0.8);

        let outcome = reviewer
            .review(&[spam_email("1", "friend@mail.example")])
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert!((outcome.candidates[0].result.confidence - 1.0).abs() < f64::EPSILON);
    }
}
