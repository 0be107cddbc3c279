//! First-match-wins rule evaluation.

use tracing::{debug, warn};

use super::model::Rule;
use crate::category::CategorySet;
use crate::source::Email;

/// Evaluates emails against an ordered rule set.
///
/// Deterministic and side-effect free: the same rule set and email always
/// yield the same result, so rule evaluation can be cached and tested without
/// the language model.
#[derive(Debug)]
pub struct RuleMatcher {
    rules: Vec<Rule>,
}

impl RuleMatcher {
    /// Builds a matcher over rules in their fixed evaluation order.
    ///
    /// Rule categories are rewritten to their canonical spelling from the
    /// active set; rules naming a category outside the set are skipped with
    /// a warning. Relative order of the remaining rules is preserved.
    #[must_use]
    pub fn new(rules: Vec<Rule>, categories: &CategorySet) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|mut rule| match categories.resolve(rule.category.as_str()) {
                Some(canonical) => {
                    rule.category = canonical;
                    Some(rule)
                }
                None => {
                    warn!(
                        pattern = rule.pattern(),
                        category = %rule.category,
                        "skipping rule for category outside the configured set"
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Returns the first rule that matches the email, or `None`.
    #[must_use]
    pub fn first_match(&self, email: &Email) -> Option<&Rule> {
        let hit = self.rules.iter().find(|rule| rule.matches(email));
        if let Some(rule) = hit {
            debug!(
                field = rule.field.as_str(),
                pattern = rule.pattern(),
                category = %rule.category,
                "rule match"
            );
        }
        hit
    }

    /// Number of active rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
