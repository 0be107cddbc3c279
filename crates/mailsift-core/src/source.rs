//! Mail store boundary: email snapshots, folders and the source trait.
//!
//! The core never talks to a mail server. A [`MailSource`] implementation
//! supplies immutable [`Email`] snapshots and performs the folder moves the
//! caller decides on.

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Maximum snippet length kept from a message body, in characters.
///
/// Bounds both rule matching and the classification prompt.
pub const SNIPPET_MAX_CHARS: usize = 1000;

/// Immutable snapshot of a message taken at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Store-assigned identifier (IMAP UID, maildir file name, ...).
    pub id: String,
    /// Sender address, as it appears in the From header.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Body snippet, bounded to [`SNIPPET_MAX_CHARS`].
    pub snippet: String,
    /// Folder the message currently lives in.
    pub folder: String,
}

impl Email {
    /// Creates a snapshot, truncating the body to the snippet bound.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: &str,
        folder: impl Into<String>,
    ) -> Self {
        let snippet = if body.chars().count() > SNIPPET_MAX_CHARS {
            body.chars().take(SNIPPET_MAX_CHARS).collect()
        } else {
            body.to_string()
        };
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            snippet,
            folder: folder.into(),
        }
    }

    /// Stable fingerprint used to recognize already-classified emails.
    ///
    /// SHA-256 over `sender|subject|id`, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(format!("{}|{}|{}", self.sender, self.subject, self.id));
        digest.iter().fold(String::new(), |mut out, byte| {
            use std::fmt::Write;
            let _ = write!(out, "{byte:02x}");
            out
        })
    }

    /// The sender's bare address when the header carries a display name,
    /// e.g. `Jane <jane@example.com>` yields `jane@example.com`.
    #[must_use]
    pub fn sender_address(&self) -> &str {
        match (self.sender.find('<'), self.sender.rfind('>')) {
            (Some(start), Some(end)) if start < end => self.sender[start + 1..end].trim(),
            _ => self.sender.trim(),
        }
    }
}

/// A folder in the mail store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Folder name.
    pub name: String,
    /// Full path (including hierarchy).
    pub path: String,
}

/// Interface to the mail store collaborator.
///
/// Implementations own session/transport concerns; the core only consumes
/// snapshots and requests moves.
pub trait MailSource {
    /// Lists all folders in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list_folders(&self) -> impl Future<Output = Result<Vec<Folder>>> + Send;

    /// Lists up to `limit` candidate emails from a folder, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be read.
    fn list_candidate_emails(
        &self,
        folder: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Email>>> + Send;

    /// Moves an email to another folder, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be moved.
    fn move_email(
        &self,
        email: &Email,
        destination_folder: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_is_bounded() {
        let body = "x".repeat(SNIPPET_MAX_CHARS * 2);
        let email = Email::new("1", "a@b.example", "hi", &body, "INBOX");
        assert_eq!(email.snippet.chars().count(), SNIPPET_MAX_CHARS);

        let short = Email::new("2", "a@b.example", "hi", "short body", "INBOX");
        assert_eq!(short.snippet, "short body");
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let a = Email::new("1", "a@b.example", "hi", "", "INBOX");
        let b = Email::new("1", "a@b.example", "hi", "different body", "Spam");
        let c = Email::new("2", "a@b.example", "hi", "", "INBOX");

        // Body and folder do not participate; identity fields do.
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_sender_address_extraction() {
        let named = Email::new("1", "Jane Doe <jane@example.com>", "s", "", "INBOX");
        assert_eq!(named.sender_address(), "jane@example.com");

        let bare = Email::new("2", "jane@example.com", "s", "", "INBOX");
        assert_eq!(bare.sender_address(), "jane@example.com");
    }
}
