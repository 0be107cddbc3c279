//! Configuration loading and defaults.
//!
//! The core engine never reads files; everything here is parsed once and
//! handed over as plain values. A commented default config is written on
//! first run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mailsift_core::{Category, CategorySet, SuggestOptions};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mailbox location and folder names.
    pub mailbox: MailboxConfig,
    /// Database location.
    pub storage: StorageConfig,
    /// Language-model endpoint settings.
    pub llm: LlmConfig,
    /// Category set and category-to-folder mapping.
    pub categories: CategoriesConfig,
    /// Personal-context settings.
    pub context: ContextConfig,
    /// Decision tunables.
    pub tuning: TuningConfig,
}

/// Mailbox location and folder names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Root of the local maildir tree.
    pub maildir: PathBuf,
    /// Folder classified candidates are read from.
    pub source_folder: String,
    /// Folder reviewed by `--review-spam`.
    pub spam_folder: String,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            maildir: dirs::home_dir().unwrap_or_default().join("Maildir"),
            source_folder: "INBOX".to_string(),
            spam_folder: "Spam".to_string(),
        }
    }
}

/// Database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the `SQLite` database holding rules and history.
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_local_dir()
                .unwrap_or_default()
                .join("mailsift")
                .join("mailsift.db"),
        }
    }
}

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions URL.
    pub api_url: String,
    /// Model name passed through to the endpoint.
    pub model: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "local-model".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Category set and category-to-folder mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    /// The closed category set, in display order.
    pub names: Vec<String>,
    /// The member spam review treats as confirmed spam.
    pub spam: String,
    /// Category name to destination folder. Unmapped categories fall back
    /// to the source folder (the email stays put).
    pub folders: BTreeMap<String, String>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        let names = [
            "Work",
            "Personal",
            "Finance",
            "Shopping",
            "Newsletter",
            "Spam",
            "Family",
            "School",
        ];
        let folders = names
            .iter()
            .map(|name| {
                let folder = if *name == "Spam" {
                    "Folders/Junk".to_string()
                } else {
                    format!("Folders/{name}")
                };
                ((*name).to_string(), folder)
            })
            .collect();
        Self {
            names: names.iter().map(ToString::to_string).collect(),
            spam: "Spam".to_string(),
            folders,
        }
    }
}

/// Personal-context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Whether context lines are appended to classification prompts.
    pub enabled: bool,
    /// File with one context statement per line; `#` starts a comment.
    pub file: Option<PathBuf>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: dirs::config_dir().map(|dir| dir.join("mailsift").join("context.txt")),
        }
    }
}

/// Decision tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Confidence floor for spam rescue.
    pub confidence_threshold: f64,
    /// Minimum history support for a suggested rule.
    pub min_support: u32,
    /// Minimum share of a key's observations the top category must hold.
    pub dominance: f64,
    /// How many recent model decisions rule suggestion mines.
    pub history_mining_limit: u32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            min_support: 3,
            dominance: 0.75,
            history_mining_limit: 1000,
        }
    }
}

impl AppConfig {
    /// Loads the config file, writing a default one on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or created.
    pub fn load_or_create(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_path()?,
        };

        if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config at {}", path.display()))?;
            let config: Self = toml::from_str(&raw)
                .with_context(|| format!("parsing config at {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            return Ok(config);
        }

        info!(path = %path.display(), "no configuration found, creating default");
        let config = Self::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let rendered =
            toml::to_string_pretty(&config).context("serializing default configuration")?;
        fs::write(&path, rendered)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        info!(
            path = %path.display(),
            "created default configuration, edit it with your mailbox and LLM details"
        );
        Ok(config)
    }

    /// The validated closed category set for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured set is invalid.
    pub fn category_set(&self) -> Result<CategorySet> {
        CategorySet::new(self.categories.names.clone(), &self.categories.spam)
            .context("invalid [categories] section")
    }

    /// Destination folder for a category; unmapped categories stay put.
    #[must_use]
    pub fn folder_for(&self, category: &Category) -> Option<String> {
        self.categories
            .folders
            .iter()
            .find(|(name, _)| category.matches(name))
            .map(|(_, folder)| folder.clone())
    }

    /// Personal-context lines, with comments and blanks filtered out.
    #[must_use]
    pub fn personal_context(&self) -> Vec<String> {
        if !self.context.enabled {
            return Vec::new();
        }
        let Some(path) = &self.context.file else {
            return Vec::new();
        };
        match fs::read_to_string(path) {
            Ok(raw) => raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToString::to_string)
                .collect(),
            Err(e) => {
                warn!(path = %path.display(), "personal context not loaded: {e}");
                Vec::new()
            }
        }
    }

    /// Suggestion tunables, with the CLI override applied.
    #[must_use]
    pub fn suggest_options(&self, min_support_override: Option<u32>) -> SuggestOptions {
        SuggestOptions {
            min_support: min_support_override.unwrap_or(self.tuning.min_support),
            dominance: self.tuning.dominance,
            ..SuggestOptions::default()
        }
    }

    /// Database path as a string, with its parent directory created.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn database_path(&self) -> Result<String> {
        if let Some(parent) = self.storage.database.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        Ok(self.storage.database.to_string_lossy().into_owned())
    }
}

/// Default config file location.
fn default_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("no config directory on this platform")?;
    Ok(dir.join("mailsift").join("config.toml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed.categories.names, config.categories.names);
        assert_eq!(parsed.llm.api_url, config.llm.api_url);
        assert!((parsed.tuning.confidence_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_categories_validate() {
        let config = AppConfig::default();
        let set = config.category_set().unwrap();
        assert_eq!(set.len(), 8);
        assert_eq!(set.spam().as_str(), "Spam");
    }

    #[test]
    fn test_folder_lookup_is_case_insensitive() {
        let config = AppConfig::default();
        assert_eq!(
            config.folder_for(&Category::new("finance")).as_deref(),
            Some("Folders/Finance")
        );
        assert_eq!(
            config.folder_for(&Category::new("Spam")).as_deref(),
            Some("Folders/Junk")
        );
        assert!(config.folder_for(&Category::new("Unknown")).is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [llm]
            api_url = "http://127.0.0.1:8080/v1/chat/completions"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.llm.api_url, "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(parsed.llm.model, "local-model");
        assert_eq!(parsed.mailbox.source_folder, "INBOX");
    }
}
