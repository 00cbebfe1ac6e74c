//! Attachment loading
//!
//! One task per file; results come back over a channel sized to the file
//! count and are joined before the turn proceeds.

use baton_llm::Attachment;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::core::AgentRunner;

impl AgentRunner {
    /// Load files concurrently; failures are skipped
    ///
    /// Results keep the order of `files`.
    pub(crate) async fn load_attachments(&self, files: &[PathBuf]) -> Vec<Attachment> {
        if files.is_empty() {
            return Vec::new();
        }

        let limit = self.settings.max_attachments;
        if files.len() > limit {
            warn!(
                requested = files.len(),
                limit, "Too many attachments; extra files skipped"
            );
        }
        let files = &files[..files.len().min(limit)];
        let max_bytes = self.settings.max_attachment_bytes;

        let (tx, mut rx) = mpsc::channel(files.len().max(1));
        for (index, path) in files.iter().cloned().enumerate() {
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = load_one(&path, max_bytes).await;
                let _ = tx.send((index, path, result)).await;
            });
        }
        drop(tx);

        let mut loaded: Vec<(usize, Attachment)> = Vec::with_capacity(files.len());
        while let Some((index, path, result)) = rx.recv().await {
            match result {
                Ok(attachment) => {
                    debug!(path = %path.display(), bytes = attachment.data.len(), "Attachment loaded");
                    loaded.push((index, attachment));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping attachment"),
            }
        }

        loaded.sort_by_key(|(index, _)| *index);
        loaded.into_iter().map(|(_, a)| a).collect()
    }
}

async fn load_one(path: &Path, max_bytes: u64) -> std::io::Result<Attachment> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    if metadata.len() > max_bytes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} bytes exceeds limit of {max_bytes}", metadata.len()),
        ));
    }
    let data = tokio::fs::read(path).await?;
    Ok(Attachment::new(path, data))
}
