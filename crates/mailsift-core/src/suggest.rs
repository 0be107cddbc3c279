//! Rule suggestion: mine history for recurring language-model decisions.
//!
//! Rule-sourced records carry no new signal, so mining only considers
//! decisions the model made. A key (sender domain or recurring subject
//! prefix) that maps to one dominant category with enough support becomes a
//! candidate deterministic rule.

use std::collections::BTreeMap;

use tracing::debug;

use crate::category::Category;
use crate::history::HistoryRecord;
use crate::pipeline::Source;
use crate::rules::{MatchKind, Rule, RuleField};

/// Tunables for the suggestion miner.
#[derive(Debug, Clone, Copy)]
pub struct SuggestOptions {
    /// Minimum evidence count for a suggestion.
    pub min_support: u32,
    /// Minimum share of a key's observations the top category must hold.
    pub dominance: f64,
    /// Mine sender-domain keys.
    pub sender_domains: bool,
    /// Mine subject-prefix keys.
    pub subject_prefixes: bool,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            min_support: 3,
            dominance: 0.75,
            sender_domains: true,
            subject_prefixes: true,
        }
    }
}

/// A candidate rule mined from history, with its supporting evidence.
///
/// Never persisted: it is either accepted (promoted into the rule set) or
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedRule {
    /// Which email field the rule would test.
    pub field: RuleField,
    /// How the pattern would be applied.
    pub match_kind: MatchKind,
    /// The mined pattern.
    pub pattern: String,
    /// The category it targets.
    pub category: Category,
    /// History records the rule would have matched to this category.
    pub evidence: u32,
    /// All history records observed for this key.
    pub observed: u32,
}

/// Per-key category tally: lowercase category name to canonical spelling
/// and count.
type CategoryCounts = BTreeMap<String, (String, u32)>;

/// Mines classification history for reusable deterministic rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSuggester {
    options: SuggestOptions,
}

impl RuleSuggester {
    /// Creates a suggester with the given tunables.
    #[must_use]
    pub const fn new(options: SuggestOptions) -> Self {
        Self { options }
    }

    /// Proposes rules from history, suppressing ones that already exist.
    ///
    /// Deterministic: unchanged history and rules yield the same suggestions
    /// in the same order (evidence descending, then pattern).
    #[must_use]
    pub fn suggest(
        &self,
        history: &[HistoryRecord],
        existing_rules: &[Rule],
    ) -> Vec<SuggestedRule> {
        let mut domains: BTreeMap<String, CategoryCounts> = BTreeMap::new();
        let mut prefixes: BTreeMap<String, CategoryCounts> = BTreeMap::new();

        for record in history {
            if record.source != Source::Llm || record.category.is_unclassified() {
                continue;
            }
            if self.options.sender_domains
                && let Some(domain) = sender_domain(record.sender_address())
            {
                tally(domains.entry(domain).or_default(), &record.category);
            }
            if self.options.subject_prefixes {
                for prefix in subject_prefixes(&record.subject) {
                    tally(prefixes.entry(prefix).or_default(), &record.category);
                }
            }
        }

        let mut suggestions = Vec::new();
        for (field, keyed) in [(RuleField::Sender, domains), (RuleField::Subject, prefixes)] {
            for (pattern, counts) in keyed {
                let Some(candidate) = self.evaluate(field, pattern, &counts) else {
                    continue;
                };
                let already_known = existing_rules.iter().any(|rule| {
                    rule.field == candidate.field
                        && rule.pattern().eq_ignore_ascii_case(&candidate.pattern)
                });
                if already_known {
                    debug!(pattern = %candidate.pattern, "suppressing already-covered suggestion");
                    continue;
                }
                suggestions.push(candidate);
            }
        }

        suggestions.sort_by(|a, b| {
            b.evidence
                .cmp(&a.evidence)
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        suggestions
    }

    /// Applies support, dominance and tie rules to one key's tally.
    fn evaluate(
        &self,
        field: RuleField,
        pattern: String,
        counts: &CategoryCounts,
    ) -> Option<SuggestedRule> {
        let observed: u32 = counts.values().map(|(_, n)| n).sum();
        let top = counts.values().map(|(_, n)| *n).max()?;
        let mut at_top = counts.values().filter(|(_, n)| *n == top);
        let (canonical, _) = at_top.next()?;
        if at_top.next().is_some() {
            // Ambiguous evidence must not silently pick a side.
            return None;
        }
        if top < self.options.min_support {
            return None;
        }
        if f64::from(top) / f64::from(observed) < self.options.dominance {
            return None;
        }
        Some(SuggestedRule {
            field,
            match_kind: MatchKind::Substring,
            pattern,
            category: Category::new(canonical),
            evidence: top,
            observed,
        })
    }
}

/// Adds one observation to a key's tally.
fn tally(counts: &mut CategoryCounts, category: &Category) {
    let entry = counts
        .entry(category.as_str().to_lowercase())
        .or_insert_with(|| (category.as_str().to_string(), 0));
    entry.1 += 1;
}

/// The `@domain` suffix of an address, lowercased.
fn sender_domain(address: &str) -> Option<String> {
    let at = address.rfind('@')?;
    let domain = &address[at..];
    (domain.len() > 1).then(|| domain.to_lowercase())
}

/// Leading 3-5 word prefixes of a subject, at least 10 characters long.
fn subject_prefixes(subject: &str) -> Vec<String> {
    let lowered = subject.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let mut prefixes = Vec::new();
    for n in 3..=words.len().min(5) {
        let prefix = words[..n].join(" ");
        if prefix.chars().count() >= 10 {
            prefixes.push(prefix);
        }
    }
    prefixes
}
