//! `MailSift` - sort mail into category folders with rules and a local LLM.
//!
//! Deterministic rules run first; a chat-completion endpoint handles the
//! rest; every decision lands in an append-only history that feeds rule
//! suggestion.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;
mod maildir;
mod report;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Args;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.debug {
        "mailsift=debug,mailsift_core=debug"
    } else {
        "mailsift=info,mailsift_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MailSift");

    let config = AppConfig::load_or_create(args.config.as_deref())?;

    if args.clear_history {
        commands::clear_history(&config).await?;
    }

    if args.list_folders {
        commands::list_folders(&config).await
    } else if args.suggest_rules {
        commands::suggest_rules(&config, &args).await
    } else if args.review_spam {
        commands::review_spam(&config, &args).await
    } else {
        commands::classify(&config, &args).await
    }
}
