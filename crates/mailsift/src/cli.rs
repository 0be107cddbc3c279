//! Command-line argument surface.

use std::path::PathBuf;

use clap::Parser;

/// Sort mail into category folders using rules and a local language model.
#[derive(Debug, Parser)]
#[command(name = "mailsift", version, about)]
pub struct Args {
    /// Maximum number of emails to process.
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Classify and report without moving any mail.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable extra debugging output.
    #[arg(long)]
    pub debug: bool,

    /// Reclassify emails already present in history.
    #[arg(long)]
    pub reprocess: bool,

    /// Clear the classification history before running.
    #[arg(long)]
    pub clear_history: bool,

    /// List all mail folders and exit.
    #[arg(long)]
    pub list_folders: bool,

    /// Suggest new classification rules from history and exit.
    #[arg(long)]
    pub suggest_rules: bool,

    /// Promote the suggested rules into the rule set (with --suggest-rules).
    #[arg(long, requires = "suggest_rules")]
    pub accept_rules: bool,

    /// Minimum history support for a suggested rule.
    #[arg(long)]
    pub min_support: Option<u32>,

    /// Review the spam folder for false positives and exit.
    #[arg(long)]
    pub review_spam: bool,

    /// Confidence threshold for spam rescue (0.0-1.0).
    #[arg(long)]
    pub confidence_threshold: Option<f64>,

    /// Move every rescued email to this folder instead of its category folder.
    #[arg(long)]
    pub rescue_folder: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["mailsift"]).unwrap();
        assert_eq!(args.limit, 100);
        assert!(!args.dry_run);
        assert!(!args.review_spam);
        assert!(args.confidence_threshold.is_none());
    }

    #[test]
    fn test_review_flags() {
        let args = Args::try_parse_from([
            "mailsift",
            "--review-spam",
            "--confidence-threshold",
            "0.8",
            "--rescue-folder",
            "INBOX",
        ])
        .unwrap();
        assert!(args.review_spam);
        assert!((args.confidence_threshold.unwrap() - 0.8).abs() < f64::EPSILON);
        assert_eq!(args.rescue_folder.as_deref(), Some("INBOX"));
    }

    #[test]
    fn test_accept_rules_requires_suggest_rules() {
        assert!(Args::try_parse_from(["mailsift", "--accept-rules"]).is_err());
        assert!(Args::try_parse_from(["mailsift", "--suggest-rules", "--accept-rules"]).is_ok());
    }
}
