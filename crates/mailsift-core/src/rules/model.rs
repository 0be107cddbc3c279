//! Rule data models.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::category::Category;
use crate::source::Email;

/// A rule definition that cannot be evaluated.
///
/// Fatal for that rule only: loading skips the offending rule and the rest of
/// the set still evaluates.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The target field name is not recognized.
    #[error("unknown rule field '{0}'")]
    UnknownField(String),

    /// The match type name is not recognized.
    #[error("unknown match type '{0}'")]
    UnknownMatchKind(String),

    /// A pattern rule holds an invalid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// The regex compile error.
        source: regex::Error,
    },
}

/// Which field of an email a rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    /// The sender address (From header).
    Sender,
    /// The subject line.
    Subject,
    /// The body snippet.
    Body,
}

impl RuleField {
    /// Parse from storage string representation.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownField`] for unrecognized names.
    pub fn parse(s: &str) -> Result<Self, RuleError> {
        match s.to_lowercase().as_str() {
            "sender" => Ok(Self::Sender),
            "subject" => Ok(Self::Subject),
            "body" => Ok(Self::Body),
            _ => Err(RuleError::UnknownField(s.to_string())),
        }
    }

    /// Convert to storage string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Subject => "subject",
            Self::Body => "body",
        }
    }

    /// The tested text of an email.
    #[must_use]
    pub fn of<'a>(&self, email: &'a Email) -> &'a str {
        match self {
            Self::Sender => &email.sender,
            Self::Subject => &email.subject,
            Self::Body => &email.snippet,
        }
    }
}

/// How a rule's pattern is applied to the field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive substring containment.
    Substring,
    /// Case-insensitive whole-field equality.
    Exact,
    /// Regular expression match (compiled case-insensitive).
    Pattern,
}

impl MatchKind {
    /// Parse from storage string representation.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownMatchKind`] for unrecognized names.
    pub fn parse(s: &str) -> Result<Self, RuleError> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            "pattern" => Ok(Self::Pattern),
            _ => Err(RuleError::UnknownMatchKind(s.to_string())),
        }
    }

    /// Convert to storage string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::Exact => "exact",
            Self::Pattern => "pattern",
        }
    }
}

/// A compiled pattern: one evaluation arm per match type.
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    /// Case-insensitive substring containment.
    Substring(String),
    /// Case-insensitive whole-field equality.
    Exact(String),
    /// Compiled regular expression.
    Pattern(Regex),
}

impl FieldMatcher {
    /// Compiles a pattern for the given match type.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] if a `Pattern` rule holds an
    /// invalid regular expression.
    pub fn compile(kind: MatchKind, pattern: &str) -> Result<Self, RuleError> {
        match kind {
            MatchKind::Substring => Ok(Self::Substring(pattern.to_string())),
            MatchKind::Exact => Ok(Self::Exact(pattern.to_string())),
            MatchKind::Pattern => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(Self::Pattern)
                .map_err(|source| RuleError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }),
        }
    }

    /// Tests the pattern against field text.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.to_lowercase().contains(&needle.to_lowercase()),
            Self::Exact(value) => text.to_lowercase() == value.to_lowercase(),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }

    /// The match type of this matcher.
    #[must_use]
    pub const fn kind(&self) -> MatchKind {
        match self {
            Self::Substring(_) => MatchKind::Substring,
            Self::Exact(_) => MatchKind::Exact,
            Self::Pattern(_) => MatchKind::Pattern,
        }
    }

    /// The pattern text as configured.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Substring(p) | Self::Exact(p) => p,
            Self::Pattern(regex) => regex.as_str(),
        }
    }
}

/// A deterministic classification rule.
///
/// Rules are evaluated in fixed insertion order; the first match wins and
/// carries confidence 1.0. No rule contributes partial confidence.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Storage identifier, `None` until persisted.
    pub id: Option<i64>,
    /// Which email field the rule tests.
    pub field: RuleField,
    /// Compiled pattern.
    pub matcher: FieldMatcher,
    /// Category assigned on match.
    pub category: Category,
}

impl Rule {
    /// Creates a rule, compiling its pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if the pattern does not compile.
    pub fn new(
        field: RuleField,
        kind: MatchKind,
        pattern: &str,
        category: Category,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            id: None,
            field,
            matcher: FieldMatcher::compile(kind, pattern)?,
            category,
        })
    }

    /// Tests this rule against an email.
    #[must_use]
    pub fn matches(&self, email: &Email) -> bool {
        self.matcher.matches(self.field.of(email))
    }

    /// The match type of this rule.
    #[must_use]
    pub const fn match_kind(&self) -> MatchKind {
        self.matcher.kind()
    }

    /// The pattern text of this rule.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }
}
