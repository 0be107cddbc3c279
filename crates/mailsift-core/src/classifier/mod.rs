//! Language-model fallback classifier.
//!
//! Formats an email into a classification prompt, sends it through a
//! [`ChatEndpoint`], and parses the free-form completion into a category and
//! confidence. A response with no recognizable category is a successful call
//! with the `unclassified` sentinel, not an error.

mod endpoint;
mod prompt;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

pub use endpoint::{ChatEndpoint, ChatMessage, ChatRequest, HttpChatEndpoint};
pub use prompt::{PromptStyle, system_prompt, user_prompt};

use crate::category::{Category, CategorySet};
use crate::pipeline::{ClassificationResult, Source};
use crate::source::Email;

/// Confidence assigned to a successfully parsed model answer.
///
/// The underlying model does not emit calibrated probabilities; this is a
/// documented approximation, overridden only when the response carries an
/// explicit parenthesized score.
pub const LLM_CONFIDENCE: f64 = 0.9;

/// Failures talking to the language-model endpoint.
///
/// All variants are per-email classification failures: the email stays
/// unclassified and unmoved, and the batch continues. Distinct from an
/// `unclassified` result, which is a successful call.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The endpoint is unreachable or the call timed out.
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// The endpoint answered with an error status.
    #[error("endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body was not a usable chat completion.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unavailable(format!("request timed out: {e}"))
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

/// Classifies emails by prompting a chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct LanguageClassifier<E> {
    endpoint: E,
    personal_context: Vec<String>,
}

impl<E: ChatEndpoint> LanguageClassifier<E> {
    /// Creates a classifier over an endpoint.
    #[must_use]
    pub const fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            personal_context: Vec::new(),
        }
    }

    /// Attaches personal-context lines appended to every system prompt.
    #[must_use]
    pub fn with_personal_context(mut self, lines: Vec<String>) -> Self {
        self.personal_context = lines;
        self
    }

    /// Classifies one email against the allowed category set.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassifierError`] when the endpoint call fails; a
    /// response without a recognizable category is `Ok` with the
    /// `unclassified` sentinel and confidence 0.0.
    pub async fn classify(
        &self,
        email: &Email,
        categories: &CategorySet,
        style: PromptStyle,
    ) -> Result<ClassificationResult, ClassifierError> {
        let request = ChatRequest::new(
            system_prompt(categories, &self.personal_context, style),
            user_prompt(email, categories),
        );

        let text = self.endpoint.complete(&request).await?;
        debug!(email_id = %email.id, response = %text, "model response");

        Ok(parse_response(&text, categories))
    }
}

/// Parses a completion into a classification result.
///
/// The first allowed category appearing as a whole token wins; when two
/// categories start at the same offset the longer name wins (so a category
/// named "Work Travel" beats "Work"). No recognizable category yields the
/// `unclassified` sentinel with confidence 0.0.
#[must_use]
pub fn parse_response(text: &str, categories: &CategorySet) -> ClassificationResult {
    earliest_category(text, categories).map_or_else(
        || {
            warn!(response = %text, "model returned no recognizable category");
            ClassificationResult {
                category: Category::unclassified(),
                source: Source::Llm,
                confidence: 0.0,
            }
        },
        |category| ClassificationResult {
            category,
            source: Source::Llm,
            confidence: explicit_score(text).unwrap_or(LLM_CONFIDENCE),
        },
    )
}

/// Finds the earliest whole-token, case-insensitive category occurrence.
fn earliest_category(text: &str, categories: &CategorySet) -> Option<Category> {
    let haystack = text.to_lowercase();

    let mut best: Option<(usize, &str)> = None;
    for name in categories.iter() {
        let Some(at) = find_token(&haystack, &name.to_lowercase()) else {
            continue;
        };
        best = match best {
            Some((best_at, best_name))
                if best_at < at || (best_at == at && best_name.len() >= name.len()) =>
            {
                Some((best_at, best_name))
            }
            _ => Some((at, name)),
        };
    }
    best.map(|(_, name)| Category::new(name))
}

/// First occurrence of `needle` in `haystack` bounded by non-alphanumerics.
fn find_token(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    for (at, _) in haystack.match_indices(needle) {
        let before_ok = haystack[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[at + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(at);
        }
    }
    None
}

#[allow(clippy::expect_used)] // the literal is a valid regex
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((0(?:\.[0-9]+)?|1(?:\.0+)?)\)").expect("valid score regex")
});

/// Extracts an explicit parenthesized score like `(0.85)`, if present.
fn explicit_score(text: &str) -> Option<f64> {
    let captured = SCORE_RE.captures(text)?;
    let value: f64 = captured.get(1)?.as_str().parse().ok()?;
    (0.0..=1.0).contains(&value).then_some(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn categories() -> CategorySet {
        CategorySet::new(
            ["Work", "Finance", "Spam"].iter().map(ToString::to_string).collect(),
            "Spam",
        )
        .unwrap()
    }

    #[test]
    fn test_category_extracted_from_free_form_text() {
        let result = parse_response("This looks like Finance.", &categories());

        assert_eq!(result.category.as_str(), "Finance");
        assert_eq!(result.source, Source::Llm);
        assert!((result.confidence - LLM_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrecognized_response_is_unclassified_not_error() {
        let result = parse_response("I'm not sure.", &categories());

        assert!(result.category.is_unclassified());
        assert_eq!(result.source, Source::Llm);
        assert!(result.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_earliest_category_wins() {
        let result = parse_response("Spam? No - this is clearly Work.", &categories());
        assert_eq!(result.category.as_str(), "Spam");
    }

    #[test]
    fn test_token_boundaries_respected() {
        // "Sparkling" contains "spam"-like letters nowhere, but "workshop"
        // must not count as Work.
        let result = parse_response("A workshop announcement.", &categories());
        assert!(result.category.is_unclassified());
    }

    #[test]
    fn test_explicit_score_overrides_default() {
        let result = parse_response("Finance (0.85)", &categories());
        assert_eq!(result.category.as_str(), "Finance");
        assert!((result.confidence - 0.85).abs() < f64::EPSILON);

        // Out-of-range scores fall back to the fixed confidence.
        let clamped = parse_response("Finance (1.5)", &categories());
        assert!((clamped.confidence - LLM_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_case_insensitive_match_keeps_canonical_spelling() {
        let result = parse_response("definitely FINANCE", &categories());
        assert_eq!(result.category.as_str(), "Finance");
    }
}
