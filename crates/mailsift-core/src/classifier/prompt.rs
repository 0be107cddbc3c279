//! Classification prompt construction.

use crate::category::CategorySet;
use crate::source::Email;

/// Which system prompt a classification call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Normal inbox classification.
    #[default]
    Standard,
    /// Spam-folder review: biased against confirming spam, so legitimate
    /// senders caught by the spam filter get a second chance.
    SpamReview,
}

/// Builds the system prompt for a category set, optionally extended with
/// personal-context lines.
#[must_use]
pub fn system_prompt(
    categories: &CategorySet,
    personal_context: &[String],
    style: PromptStyle,
) -> String {
    let spam = categories.spam();
    let list = categories.joined(", ");

    let mut prompt = match style {
        PromptStyle::Standard => format!(
            "You are an email classifier. Categorize each email into exactly one of \
             these categories: {list}.\n\
             Reply with the category name only.\n\
             Be especially careful about categorizing as {spam} - only use it for \
             unsolicited commercial messages, scams, or true junk mail."
        ),
        PromptStyle::SpamReview => format!(
            "You are an email classifier focusing on identifying false positives in \
             spam detection. Review each email carefully to determine if it is \
             legitimate or actual spam.\n\
             Categorize each email into exactly one of these categories: {list}.\n\
             Reply with the category name only.\n\
             IMPORTANT: If there is ANY indication the email is from a legitimate \
             sender the user might want to see, do NOT classify it as {spam}. \
             Consider the sender domain, writing style, and content; many legitimate \
             newsletters and marketing emails are incorrectly flagged as spam."
        ),
    };

    if !personal_context.is_empty() {
        prompt.push_str(
            "\n\nHere is some personal context to help you better classify emails:\n",
        );
        prompt.push_str(&personal_context.join("\n"));
        prompt.push_str(
            "\nUse this context to better understand the significance of senders and \
             email contents.",
        );
    }

    prompt
}

/// Builds the user message carrying the email summary.
#[must_use]
pub fn user_prompt(email: &Email, categories: &CategorySet) -> String {
    format!(
        "Please categorize this email into exactly one of these categories: {list}.\n\n\
         Subject: {subject}\n\
         From: {from}\n\
         From Email: {address}\n\n\
         {snippet}",
        list = categories.joined(", "),
        subject = email.subject,
        from = email.sender,
        address = email.sender_address(),
        snippet = email.snippet,
    )
}
