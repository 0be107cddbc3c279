//! Console run summaries.
//!
//! Plain output, one fact per line; structured diagnostics go through
//! `tracing` instead.

use mailsift_core::{Folder, SuggestedRule};

/// Tally of one batch classification run.
#[derive(Debug, Default)]
pub struct ClassifySummary {
    /// Candidates examined.
    pub processed: usize,
    /// Emails assigned a category.
    pub classified: usize,
    /// Emails the model could not place.
    pub unclassified: usize,
    /// Emails skipped because history already covers them.
    pub skipped: usize,
    /// Per-email classification failures.
    pub failures: usize,
    /// Emails actually moved.
    pub moved: usize,
    /// Whether moves were suppressed.
    pub dry_run: bool,
}

impl ClassifySummary {
    /// Prints the run summary.
    pub fn print(&self) {
        println!("Run summary");
        println!("  processed:    {}", self.processed);
        println!("  classified:   {}", self.classified);
        println!("  unclassified: {}", self.unclassified);
        println!("  skipped:      {}", self.skipped);
        println!("  failures:     {}", self.failures);
        if self.dry_run {
            println!("  moved:        0 (dry run)");
        } else {
            println!("  moved:        {}", self.moved);
        }
    }
}

/// Tally of one spam review run.
#[derive(Debug, Default)]
pub struct ReviewSummary {
    /// Spam-folder emails reviewed.
    pub reviewed: usize,
    /// False positives moved out of the spam folder.
    pub rescued: usize,
    /// Emails confirmed as spam.
    pub confirmed_spam: u32,
    /// Non-spam reclassifications below the confidence threshold.
    pub below_threshold: u32,
    /// Per-email classification failures.
    pub failures: u32,
    /// Whether moves were suppressed.
    pub dry_run: bool,
}

impl ReviewSummary {
    /// Prints the review summary.
    pub fn print(&self) {
        println!("Spam review summary");
        println!("  reviewed:        {}", self.reviewed);
        if self.dry_run {
            println!("  rescued:         0 (dry run, {} candidates)", self.rescued);
        } else {
            println!("  rescued:         {}", self.rescued);
        }
        println!("  confirmed spam:  {}", self.confirmed_spam);
        println!("  below threshold: {}", self.below_threshold);
        println!("  failures:        {}", self.failures);
    }
}

/// Prints the folder list.
pub fn print_folders(folders: &[Folder]) {
    println!("{} folders:", folders.len());
    for folder in folders {
        println!("  {}", folder.name);
    }
}

/// Prints suggested rules with their supporting evidence.
pub fn print_suggestions(suggestions: &[SuggestedRule]) {
    if suggestions.is_empty() {
        println!("No rule suggestions (not enough consistent history yet).");
        return;
    }
    println!("{} suggested rules:", suggestions.len());
    for s in suggestions {
        println!(
            "  {} {} \"{}\" -> {}  ({} of {} matching decisions)",
            s.field.as_str(),
            s.match_kind.as_str(),
            s.pattern,
            s.category,
            s.evidence,
            s.observed,
        );
    }
}
