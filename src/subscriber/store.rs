//! Line-oriented file storage for the subscriber set.
//!
//! The file holds one decimal chat ID per line. Every save rewrites the
//! whole set through a temporary sibling file followed by a rename, so a
//! crash mid-write leaves either the old or the new set on disk.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::subscriber::types::ChatId;
use crate::{RelayError, Result};

/// File-backed subscriber storage.
#[derive(Debug, Clone)]
pub struct SubscriberStore {
    path: PathBuf,
}

impl SubscriberStore {
    /// Create a store for the given file path. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the subscriber file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored set.
    ///
    /// A missing file is an empty set. A file that exists but does not parse
    /// is moved aside to `<file>.corrupt` and also yields an empty set.
    /// Other read failures (e.g. permissions) are returned, since treating
    /// them as empty would overwrite real data on the next save.
    pub async fn load(&self) -> Result<BTreeSet<ChatId>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                self.quarantine("not valid UTF-8").await;
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        match parse_ids(&content) {
            Ok(ids) => Ok(ids),
            Err(line) => {
                self.quarantine(&format!("unparseable line {line:?}")).await;
                Ok(BTreeSet::new())
            }
        }
    }

    /// Persist the full set, replacing the previous contents.
    pub async fn save(&self, ids: &BTreeSet<ChatId>) -> Result<()> {
        self.write_atomic(&render_ids(ids))
            .await
            .map_err(|e| RelayError::Persistence(format!("{}: {e}", self.path.display())))
    }

    async fn write_atomic(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.sibling("tmp");
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await
    }

    async fn quarantine(&self, reason: &str) {
        let aside = self.sibling("corrupt");
        warn!(
            "Subscriber store {} is malformed ({}); starting with no subscribers",
            self.path.display(),
            reason
        );
        if let Err(e) = fs::rename(&self.path, &aside).await {
            warn!(
                "Failed to move malformed store to {}: {}",
                aside.display(),
                e
            );
        } else {
            warn!("Malformed store kept at {}", aside.display());
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// Parse stored content. Blank lines are skipped; on failure the offending line is returned.
fn parse_ids(content: &str) -> std::result::Result<BTreeSet<ChatId>, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.parse::<ChatId>().map_err(|_| line.to_string()))
        .collect()
}

fn render_ids(ids: &BTreeSet<ChatId>) -> String {
    let mut out = String::with_capacity(ids.len() * 12);
    for id in ids {
        out.push_str(&id.to_string());
        out.push('\n');
    }
    out
}
