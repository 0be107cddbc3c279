//! Local maildir implementation of the mail store boundary.
//!
//! Folders are directories under a root, each with the usual `cur`/`new`/
//! `tmp` subdirectories; nested folders like `Folders/Work` are plain nested
//! directories. Moving a message is a rename, so an aborted run never loses
//! mail.

use std::fs;
use std::path::{Path, PathBuf};

use mailparse::MailHeaderMap;
use tracing::{debug, warn};

use mailsift_core::{Email, Error, Folder, MailSource, Result};

const SUBDIRS: [&str; 3] = ["cur", "new", "tmp"];

/// Mail store over a local maildir tree.
#[derive(Debug, Clone)]
pub struct MaildirSource {
    root: PathBuf,
}

impl MaildirSource {
    /// Creates a source rooted at a maildir tree.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_dir(&self, folder: &str) -> PathBuf {
        self.root.join(folder)
    }

    fn scan_folders(&self, dir: &Path, prefix: &str, out: &mut Vec<Folder>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let child = entry.file_name().to_string_lossy().into_owned();
            if SUBDIRS.contains(&child.as_str()) {
                continue;
            }
            let name = if prefix.is_empty() {
                child
            } else {
                format!("{prefix}/{child}")
            };
            let path = entry.path();
            if path.join("cur").is_dir() || path.join("new").is_dir() {
                out.push(Folder {
                    name: name.clone(),
                    path: path.to_string_lossy().into_owned(),
                });
            }
            self.scan_folders(&path, &name, out)?;
        }
        Ok(())
    }

    fn message_files(&self, folder: &str) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.folder_dir(folder);
        if !dir.is_dir() {
            return Err(Error::Mail(format!("no such folder '{folder}'")));
        }

        let mut files = Vec::new();
        for sub in ["new", "cur"] {
            let sub_dir = dir.join(sub);
            if !sub_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&sub_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
                }
            }
        }
        // Maildir file names start with a timestamp, so reverse name order
        // approximates newest first.
        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files)
    }

    fn locate(&self, email: &Email) -> Result<PathBuf> {
        for sub in ["cur", "new"] {
            let candidate = self.folder_dir(&email.folder).join(sub).join(&email.id);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Error::Mail(format!(
            "message '{}' not found in folder '{}'",
            email.id, email.folder
        )))
    }
}

impl MailSource for MaildirSource {
    async fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut folders = Vec::new();
        if self.root.join("cur").is_dir() || self.root.join("new").is_dir() {
            folders.push(Folder {
                name: "INBOX".to_string(),
                path: self.root.to_string_lossy().into_owned(),
            });
        }
        self.scan_folders(&self.root, "", &mut folders)?;
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn list_candidate_emails(&self, folder: &str, limit: usize) -> Result<Vec<Email>> {
        let files = self.message_files(folder)?;
        debug!(folder, total = files.len(), "listing candidate emails");

        let mut emails = Vec::new();
        for (name, path) in files.into_iter().take(limit) {
            let raw = fs::read(&path)?;
            match parse_message(&name, &raw, folder) {
                Ok(email) => emails.push(email),
                Err(e) => warn!(file = %path.display(), "skipping unparsable message: {e}"),
            }
        }
        Ok(emails)
    }

    async fn move_email(&self, email: &Email, destination_folder: &str) -> Result<()> {
        let source = self.locate(email)?;

        let dest_dir = self.folder_dir(destination_folder);
        for sub in SUBDIRS {
            fs::create_dir_all(dest_dir.join(sub))?;
        }

        let target = unique_target(&dest_dir.join("cur"), &email.id);
        if fs::rename(&source, &target).is_err() {
            // Cross-filesystem move: copy then delete.
            fs::copy(&source, &target)?;
            fs::remove_file(&source)?;
        }
        debug!(
            id = %email.id,
            from = %email.folder,
            to = destination_folder,
            "moved message"
        );
        Ok(())
    }
}

/// Picks a non-colliding file name in the target directory.
fn unique_target(dir: &Path, name: &str) -> PathBuf {
    let direct = dir.join(name);
    if !direct.exists() {
        return direct;
    }
    for i in 1..1000 {
        let candidate = dir.join(format!("{name}-{i}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    direct
}

/// Parses a raw message into an email snapshot.
fn parse_message(id: &str, raw: &[u8], folder: &str) -> Result<Email> {
    let mail = mailparse::parse_mail(raw).map_err(|e| Error::Mail(e.to_string()))?;

    let sender = mail.headers.get_first_value("From").unwrap_or_default();
    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    let body = plain_text_body(&mail).unwrap_or_default();

    Ok(Email::new(id, sender, subject, &body, folder))
}

/// The first `text/plain` part of a message, depth first.
fn plain_text_body(mail: &mailparse::ParsedMail<'_>) -> Option<String> {
    if mail.subparts.is_empty() {
        return if mail.ctype.mimetype.starts_with("text/") {
            mail.get_body().ok()
        } else {
            None
        };
    }
    for part in &mail.subparts {
        if part.ctype.mimetype == "text/plain" {
            if let Ok(body) = part.get_body() {
                return Some(body);
            }
        }
        if let Some(body) = plain_text_body(part) {
            return Some(body);
        }
    }
    None
}
