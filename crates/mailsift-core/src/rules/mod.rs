//! Deterministic pattern rules: models, matcher and persistence.

mod matcher;
mod model;
mod repository;

pub use matcher::RuleMatcher;
pub use model::{FieldMatcher, MatchKind, Rule, RuleError, RuleField};
pub use repository::RuleRepository;
