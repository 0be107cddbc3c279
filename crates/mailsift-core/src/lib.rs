//! # mailsift-core
//!
//! Classification decision engine for the `MailSift` mail sorter.
//!
//! This crate provides:
//! - Ordered deterministic pattern rules and a first-match-wins matcher
//! - A language-model fallback classifier over a chat-completion endpoint
//! - The classification pipeline (rules first, model second, history always)
//! - An append-only history of every classification decision (`SQLite`)
//! - Spam-folder review that rescues high-confidence false positives
//! - A rule-suggestion miner that turns recurring model decisions into
//!   reusable deterministic rules
//!
//! The mail store and the chat-completion endpoint are collaborators behind
//! the [`MailSource`] and [`ChatEndpoint`] traits; this crate never talks to
//! a mail server or reads configuration files itself.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod category;
pub mod classifier;
mod error;
pub mod history;
pub mod pipeline;
pub mod review;
pub mod rules;
pub mod source;
pub mod suggest;

pub use category::{Category, CategorySet};
pub use classifier::{
    ChatEndpoint, ChatMessage, ChatRequest, ClassifierError, HttpChatEndpoint, LanguageClassifier,
    PromptStyle,
};
pub use error::{Error, Result};
pub use history::{HistoryRecord, HistoryRepository};
pub use pipeline::{ClassificationPipeline, ClassificationResult, Source};
pub use review::{RescueCandidate, ReviewOutcome, SpamReviewer};
pub use rules::{FieldMatcher, MatchKind, Rule, RuleError, RuleField, RuleMatcher, RuleRepository};
pub use source::{Email, Folder, MailSource};
pub use suggest::{RuleSuggester, SuggestOptions, SuggestedRule};
