//! Integration tests for the classification pipeline.
//!
//! These tests use a scripted chat endpoint to simulate language-model
//! responses without requiring a real completion server.

use std::sync::Mutex;

use mailsift_core::{
    Category, CategorySet, ChatEndpoint, ChatRequest, ClassificationPipeline, ClassifierError,
    Email, HistoryRepository, LanguageClassifier, MatchKind, Rule, RuleField, RuleMatcher,
    RuleSuggester, SpamReviewer, Source, SuggestOptions,
};

/// Endpoint returning scripted replies in order; panics when exhausted.
struct ScriptedEndpoint {
    replies: Mutex<Vec<String>>,
}

impl ScriptedEndpoint {
    fn new(replies: &[&str]) -> Self {
        let replies: Vec<String> = replies.iter().rev().map(ToString::to_string).collect();
        Self {
            replies: Mutex::new(replies),
        }
    }

    fn exhausted(&self) -> bool {
        self.replies.lock().is_ok_and(|r| r.is_empty())
    }
}

impl ChatEndpoint for &ScriptedEndpoint {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, ClassifierError> {
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop())
            .ok_or_else(|| ClassifierError::Unavailable("no scripted reply left".into()))
    }
}

fn categories() -> CategorySet {
    CategorySet::new(
        ["Work", "Personal", "Finance", "Newsletter", "Spam"]
            .iter()
            .map(ToString::to_string)
            .collect(),
        "Spam",
    )
    .unwrap()
}

fn newsletter_rule() -> Rule {
    Rule::new(
        RuleField::Sender,
        MatchKind::Substring,
        "newsletter@",
        Category::new("Newsletter"),
    )
    .unwrap()
}

async fn pipeline<'e>(
    rules: Vec<Rule>,
    endpoint: &'e ScriptedEndpoint,
) -> ClassificationPipeline<&'e ScriptedEndpoint> {
    let categories = categories();
    ClassificationPipeline::new(
        RuleMatcher::new(rules, &categories),
        LanguageClassifier::new(endpoint),
        HistoryRepository::in_memory().await.unwrap(),
        categories,
    )
}

#[tokio::test]
async fn rule_match_wins_with_empty_history_and_no_model_call() {
    // No scripted replies: any model call would error the test.
    let endpoint = ScriptedEndpoint::new(&[]);
    let pipeline = pipeline(vec![newsletter_rule()], &endpoint).await;

    let email = Email::new("1", "deals-newsletter@shop.example", "Deals!", "", "INBOX");
    let result = pipeline.classify(&email).await.unwrap();

    assert_eq!(result.category.as_str(), "Newsletter");
    assert_eq!(result.source, Source::Rule);
    assert!((result.confidence - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn model_free_text_parses_to_category() {
    let endpoint = ScriptedEndpoint::new(&["This looks like Finance."]);
    let pipeline = pipeline(vec![], &endpoint).await;

    let email = Email::new("2", "billing@acme.example", "Invoice", "due soon", "INBOX");
    let result = pipeline.classify(&email).await.unwrap();

    assert_eq!(result.category.as_str(), "Finance");
    assert_eq!(result.source, Source::Llm);
    assert!((result.confidence - 0.9).abs() < f64::EPSILON);
    assert!(endpoint.exhausted());
}

#[tokio::test]
async fn unsure_model_reply_is_unclassified_without_error() {
    let endpoint = ScriptedEndpoint::new(&["I'm not sure."]);
    let pipeline = pipeline(vec![], &endpoint).await;

    let email = Email::new("3", "mystery@example.com", "??", "", "INBOX");
    let result = pipeline.classify(&email).await.unwrap();

    assert!(result.category.is_unclassified());
    assert_eq!(result.source, Source::Llm);
    assert!(result.confidence.abs() < f64::EPSILON);
}

#[tokio::test]
async fn spam_review_gates_on_confidence_threshold() {
    let endpoint = ScriptedEndpoint::new(&["Work (0.9)", "Personal (0.6)"]);
    let pipeline = pipeline(vec![], &endpoint).await;
    let reviewer = SpamReviewer::new(&pipeline, 0.8);

    let emails = vec![
        Email::new("1", "boss@corp.example", "Q3 planning", "", "Spam"),
        Email::new("2", "friend@mail.example", "lunch", "", "Spam"),
    ];
    let outcome = reviewer.review(&emails).await.unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].email.id, "1");
    assert_eq!(outcome.candidates[0].result.category.as_str(), "Work");
    assert_eq!(outcome.below_threshold, 1);
}

#[tokio::test]
async fn review_continues_past_endpoint_failures() {
    // One reply for three emails: the second and third calls fail.
    let endpoint = ScriptedEndpoint::new(&["Work (0.9)"]);
    let pipeline = pipeline(vec![], &endpoint).await;
    let reviewer = SpamReviewer::new(&pipeline, 0.8);

    let emails = vec![
        Email::new("1", "boss@corp.example", "a", "", "Spam"),
        Email::new("2", "b@x.example", "b", "", "Spam"),
        Email::new("3", "c@y.example", "c", "", "Spam"),
    ];
    let outcome = reviewer.review(&emails).await.unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.failures, 2);
}

#[tokio::test]
async fn mined_llm_decisions_become_a_domain_rule() {
    let replies = ["Finance"; 5];
    let endpoint = ScriptedEndpoint::new(&replies);
    let history = HistoryRepository::in_memory().await.unwrap();
    let categories = categories();
    let pipeline = ClassificationPipeline::new(
        RuleMatcher::new(vec![], &categories),
        LanguageClassifier::new(&endpoint),
        history.clone(),
        categories,
    );

    for i in 0..5 {
        let email = Email::new(
            i.to_string(),
            "billing@acme.com",
            format!("Statement {i}"),
            "your monthly statement",
            "INBOX",
        );
        pipeline.classify(&email).await.unwrap();
    }

    let records = history.llm_records(1000).await.unwrap();
    let suggester = RuleSuggester::new(SuggestOptions {
        min_support: 3,
        subject_prefixes: false,
        ..SuggestOptions::default()
    });
    let suggestions = suggester.suggest(&records, &[]);

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].pattern, "@acme.com");
    assert_eq!(suggestions[0].category.as_str(), "Finance");
    assert_eq!(suggestions[0].evidence, 5);

    // Accepting the suggestion suppresses it on the next pass.
    let accepted = Rule::new(
        suggestions[0].field,
        suggestions[0].match_kind,
        &suggestions[0].pattern,
        suggestions[0].category.clone(),
    )
    .unwrap();
    assert!(suggester.suggest(&records, &[accepted]).is_empty());
}
