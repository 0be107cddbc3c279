//! Category values and the validated closed category set.
//!
//! The set of categories is configuration-defined at run start, not fixed at
//! build time. A [`CategorySet`] is loaded once per run and threaded
//! explicitly into the matcher, the classifier and the suggester.

use crate::error::{Error, Result};

/// Reserved name for emails the classifier could not place.
pub const UNCLASSIFIED: &str = "unclassified";

/// A category name.
///
/// Carries the canonical spelling from the configured set, or the reserved
/// [`UNCLASSIFIED`] sentinel. History records may hold names that are no
/// longer in the active set, so a `Category` on its own makes no membership
/// claim; use [`CategorySet::resolve`] to validate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Creates a category from a raw name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The reserved sentinel for unplaceable emails.
    #[must_use]
    pub fn unclassified() -> Self {
        Self(UNCLASSIFIED.to_string())
    }

    /// Returns true if this is the reserved sentinel.
    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        self.0.eq_ignore_ascii_case(UNCLASSIFIED)
    }

    /// The category name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed, configuration-defined set of categories for a run.
#[derive(Debug, Clone)]
pub struct CategorySet {
    names: Vec<String>,
    spam: String,
}

impl CategorySet {
    /// Builds a validated category set.
    ///
    /// `spam_category` names the member that spam-folder review treats as
    /// confirmed spam.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the set is empty, contains duplicates
    /// (case-insensitively), contains the reserved [`UNCLASSIFIED`] name, or
    /// does not contain `spam_category`.
    pub fn new(names: Vec<String>, spam_category: &str) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::Config("category set must not be empty".into()));
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::Config("category names must not be blank".into()));
            }
            if name.eq_ignore_ascii_case(UNCLASSIFIED) {
                return Err(Error::Config(format!(
                    "'{UNCLASSIFIED}' is reserved and cannot be a category"
                )));
            }
            if names[..i].iter().any(|n| n.eq_ignore_ascii_case(name)) {
                return Err(Error::Config(format!("duplicate category '{name}'")));
            }
        }
        let spam = names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(spam_category))
            .cloned()
            .ok_or_else(|| {
                Error::Config(format!(
                    "spam category '{spam_category}' is not in the category set"
                ))
            })?;
        Ok(Self { names, spam })
    }

    /// Resolves a raw name to its canonical spelling, if it is a member.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Category> {
        self.names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(Category::new)
    }

    /// Returns true if the name is a member (case-insensitive).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// The category spam-folder review treats as confirmed spam.
    #[must_use]
    pub fn spam(&self) -> Category {
        Category::new(&self.spam)
    }

    /// Member names in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a validated set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Member names joined for display and prompting.
    #[must_use]
    pub fn joined(&self, sep: &str) -> String {
        self.names.join(sep)
    }
}
