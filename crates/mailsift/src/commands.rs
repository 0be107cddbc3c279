//! Run-mode implementations: batch classify, spam review, rule suggestion.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use mailsift_core::{
    ClassificationPipeline, HistoryRepository, HttpChatEndpoint, LanguageClassifier, MailSource,
    Rule, RuleMatcher, RuleRepository, RuleSuggester, SpamReviewer,
};

use crate::cli::Args;
use crate::config::AppConfig;
use crate::maildir::MaildirSource;
use crate::report::{ClassifySummary, ReviewSummary, print_folders, print_suggestions};

async fn open_repositories(config: &AppConfig) -> Result<(RuleRepository, HistoryRepository)> {
    let db = config.database_path()?;
    let rules = RuleRepository::new(&db).await.context("opening rule store")?;
    let history = HistoryRepository::new(&db)
        .await
        .context("opening history store")?;
    Ok((rules, history))
}

fn build_pipeline(
    config: &AppConfig,
    rules: Vec<Rule>,
    history: HistoryRepository,
) -> Result<ClassificationPipeline<HttpChatEndpoint>> {
    let categories = config.category_set()?;
    let matcher = RuleMatcher::new(rules, &categories);
    let endpoint = HttpChatEndpoint::new(
        config.llm.api_url.clone(),
        config.llm.model.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    let classifier =
        LanguageClassifier::new(endpoint).with_personal_context(config.personal_context());
    Ok(ClassificationPipeline::new(
        matcher, classifier, history, categories,
    ))
}

/// Clears the classification history.
pub async fn clear_history(config: &AppConfig) -> Result<()> {
    let (_, history) = open_repositories(config).await?;
    history.clear().await?;
    info!("cleared classification history");
    Ok(())
}

/// Lists all mail folders.
pub async fn list_folders(config: &AppConfig) -> Result<()> {
    let source = MaildirSource::new(&config.mailbox.maildir);
    let folders = source.list_folders().await?;
    print_folders(&folders);
    Ok(())
}

/// Default mode: classify candidates and file them into category folders.
pub async fn classify(config: &AppConfig, args: &Args) -> Result<()> {
    let (rules_repo, history) = open_repositories(config).await?;
    let rules = rules_repo.load().await?;
    info!(rules = rules.len(), "loaded rule set");
    let pipeline = build_pipeline(config, rules, history)?;

    let source = MaildirSource::new(&config.mailbox.maildir);
    let emails = source
        .list_candidate_emails(&config.mailbox.source_folder, args.limit)
        .await?;
    info!(
        count = emails.len(),
        folder = %config.mailbox.source_folder,
        "found candidate emails"
    );

    let mut summary = ClassifySummary {
        dry_run: args.dry_run,
        ..ClassifySummary::default()
    };

    for email in &emails {
        summary.processed += 1;

        if !args.reprocess && pipeline.already_classified(email).await? {
            summary.skipped += 1;
            continue;
        }

        let result = match pipeline.classify(email).await {
            Ok(result) => result,
            Err(e) if e.is_per_email() => {
                warn!(email_id = %email.id, "classification failed: {e}");
                summary.failures += 1;
                continue;
            }
            Err(e) => return Err(e).context("classification run aborted"),
        };

        if result.category.is_unclassified() {
            summary.unclassified += 1;
            continue;
        }
        summary.classified += 1;

        let Some(target) = config.folder_for(&result.category) else {
            warn!(category = %result.category, "no folder mapped, leaving email in place");
            continue;
        };
        if target == email.folder {
            continue;
        }

        if args.dry_run {
            info!(email_id = %email.id, to = %target, "[dry run] would move");
        } else {
            match source.move_email(email, &target).await {
                Ok(()) => summary.moved += 1,
                Err(e) => warn!(email_id = %email.id, to = %target, "move failed: {e}"),
            }
        }
    }

    summary.print();
    Ok(())
}

/// Reviews the spam folder and rescues high-confidence false positives.
pub async fn review_spam(config: &AppConfig, args: &Args) -> Result<()> {
    let (rules_repo, history) = open_repositories(config).await?;
    let rules = rules_repo.load().await?;
    let pipeline = build_pipeline(config, rules, history)?;

    let source = MaildirSource::new(&config.mailbox.maildir);
    let emails = source
        .list_candidate_emails(&config.mailbox.spam_folder, args.limit)
        .await?;
    if emails.is_empty() {
        info!(folder = %config.mailbox.spam_folder, "no emails to review");
        return Ok(());
    }

    let threshold = args
        .confidence_threshold
        .unwrap_or(config.tuning.confidence_threshold);
    info!(
        count = emails.len(),
        threshold, "reviewing spam folder for false positives"
    );

    let reviewer = SpamReviewer::new(&pipeline, threshold);
    let outcome = reviewer.review(&emails).await?;

    let mut summary = ReviewSummary {
        reviewed: emails.len(),
        confirmed_spam: outcome.confirmed_spam,
        below_threshold: outcome.below_threshold,
        failures: outcome.failures,
        dry_run: args.dry_run,
        ..ReviewSummary::default()
    };

    for candidate in &outcome.candidates {
        let target = args
            .rescue_folder
            .clone()
            .or_else(|| config.folder_for(&candidate.result.category))
            .unwrap_or_else(|| "INBOX".to_string());

        if args.dry_run {
            info!(
                email_id = %candidate.email.id,
                category = %candidate.result.category,
                to = %target,
                "[dry run] would rescue"
            );
            summary.rescued += 1;
        } else {
            match source.move_email(&candidate.email, &target).await {
                Ok(()) => {
                    info!(
                        email_id = %candidate.email.id,
                        category = %candidate.result.category,
                        to = %target,
                        "rescued false positive"
                    );
                    summary.rescued += 1;
                }
                Err(e) => {
                    warn!(email_id = %candidate.email.id, to = %target, "rescue failed: {e}");
                }
            }
        }
    }

    summary.print();
    Ok(())
}

/// Mines history for new deterministic rules, optionally accepting them.
pub async fn suggest_rules(config: &AppConfig, args: &Args) -> Result<()> {
    let (rules_repo, history) = open_repositories(config).await?;
    let records = history
        .llm_records(config.tuning.history_mining_limit)
        .await?;
    let existing = rules_repo.load().await?;
    info!(
        records = records.len(),
        existing_rules = existing.len(),
        "mining history for rule suggestions"
    );

    let suggester = RuleSuggester::new(config.suggest_options(args.min_support));
    let suggestions = suggester.suggest(&records, &existing);
    print_suggestions(&suggestions);

    if args.accept_rules {
        for s in &suggestions {
            rules_repo
                .append(s.field, s.match_kind, &s.pattern, &s.category)
                .await?;
            info!(pattern = %s.pattern, category = %s.category, "accepted rule");
        }
        info!(count = suggestions.len(), "rule set updated");
    }
    Ok(())
}
