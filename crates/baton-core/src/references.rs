//! `@` reference expansion for prompts
//!
//! A reference starts the text or follows whitespace:
//!
//! - `@template:NAME`, `@system:NAME`: stored prompt text
//! - `@prompt:NAME`: template first, then system prompt
//! - `@convo:NAME`: the last turns of a stored conversation
//! - `@PATH`: file contents, or a listing for a directory
//!
//! Unresolved references stay in the text. Resolution never fails the turn.

use crate::config::ConfigStore;
use crate::conversation::ConversationStore;
use crate::error::Result;
use baton_llm::ProviderKind;
use regex::Regex;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s)@(\S+)").expect("REFERENCE_REGEX is a compile-time constant")
});

/// Default number of turns pulled in by `@convo:`
pub const DEFAULT_CONVO_TURNS: usize = 10;

/// Default size limit for files inlined by `@PATH`
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Expands `@` references in prompt text
pub struct ReferenceResolver {
    config: Arc<dyn ConfigStore>,
    conversations: Option<ConversationStore>,
    base_dir: PathBuf,
    convo_turns: usize,
    max_file_bytes: u64,
}

impl ReferenceResolver {
    /// Create a resolver; relative paths resolve against the current directory
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            conversations: None,
            base_dir: PathBuf::from("."),
            convo_turns: DEFAULT_CONVO_TURNS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Enable `@convo:` references
    #[must_use]
    pub fn with_conversations(mut self, store: ConversationStore) -> Self {
        self.conversations = Some(store);
        self
    }

    /// Resolve relative paths against `dir`
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Number of trailing turns included for `@convo:`
    #[must_use]
    pub fn with_convo_turns(mut self, turns: usize) -> Self {
        self.convo_turns = turns;
        self
    }

    /// Files larger than this stay unresolved
    #[must_use]
    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    /// Expand every resolvable reference in `text`
    pub async fn process_text(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for captures in REFERENCE_REGEX.captures_iter(text) {
            let Some(token) = captures.get(2) else {
                continue;
            };
            match self.resolve(token.as_str()).await {
                Ok(Some(content)) => {
                    // Keep everything before the '@', drop the marker itself
                    output.push_str(&text[last..token.start() - 1]);
                    output.push_str(&content);
                    last = token.end();
                }
                Ok(None) => {
                    warn!(reference = %token.as_str(), "Unresolved reference left as-is");
                }
                Err(e) => {
                    warn!(reference = %token.as_str(), error = %e, "Reference resolution failed");
                    return text.to_string();
                }
            }
        }

        output.push_str(&text[last..]);
        output
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        if let Some(name) = token.strip_prefix("template:") {
            return self.config.get_template(name).await;
        }
        if let Some(name) = token.strip_prefix("system:") {
            return self.config.get_system_prompt(name).await;
        }
        if let Some(name) = token.strip_prefix("prompt:") {
            if let Some(template) = self.config.get_template(name).await? {
                return Ok(Some(template));
            }
            return self.config.get_system_prompt(name).await;
        }
        if let Some(name) = token.strip_prefix("convo:") {
            return self.resolve_conversation(name);
        }
        self.resolve_path(token).await
    }

    fn resolve_conversation(&self, name: &str) -> Result<Option<String>> {
        let Some(store) = &self.conversations else {
            return Ok(None);
        };
        // After a hand-off across providers the newest copy is the live one
        let Some(provider) = store.latest(name, ProviderKind::Unknown)? else {
            return Ok(None);
        };

        let turns = store.load(name, provider)?;
        let skip = turns.len().saturating_sub(self.convo_turns);
        let mut rendered = format!("Conversation '{name}':\n");
        for turn in &turns[skip..] {
            let text = turn.text();
            if text.is_empty() {
                continue;
            }
            let _ = writeln!(rendered, "{}: {}", turn.role, text);
        }
        debug!(conversation = %name, turns = turns.len() - skip, "Inlined conversation");
        Ok(Some(rendered))
    }

    async fn resolve_path(&self, token: &str) -> Result<Option<String>> {
        let path = Path::new(token);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            let mut names = Vec::new();
            let mut entries = tokio::fs::read_dir(&path).await?;
            while let Some(entry) = entries.next_entry().await? {
                let mut name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type().await?.is_dir() {
                    name.push('/');
                }
                names.push(name);
            }
            names.sort();
            let mut listing = format!("Directory {token}:\n");
            for name in names {
                let _ = writeln!(listing, "- {name}");
            }
            return Ok(Some(listing));
        }

        if metadata.is_file() {
            if metadata.len() > self.max_file_bytes {
                warn!(
                    path = %path.display(),
                    size = metadata.len(),
                    limit = self.max_file_bytes,
                    "Referenced file too large, not inlined"
                );
                return Ok(None);
            }
            let content = tokio::fs::read_to_string(&path).await?;
            return Ok(Some(format!("File {token}:\n```\n{content}\n```")));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, FileConfigStore};
    use baton_llm::{ProviderKind, Turn};

    fn resolver(dir: &Path) -> ReferenceResolver {
        let mut config = AppConfig::default();
        config
            .templates
            .insert("review".to_string(), "Review carefully.".to_string());
        config
            .system_prompts
            .insert("terse".to_string(), "Be terse.".to_string());

        ReferenceResolver::new(Arc::new(FileConfigStore::in_memory(config)))
            .with_base_dir(dir)
            .with_conversations(ConversationStore::new(dir.join("convos")))
    }

    #[tokio::test]
    async fn test_prompt_references() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());

        assert_eq!(
            r.process_text("@template:review the diff").await,
            "Review carefully. the diff"
        );
        assert_eq!(r.process_text("note: @system:terse").await, "note: Be terse.");
        assert_eq!(r.process_text("@prompt:terse").await, "Be terse.");
        assert_eq!(r.process_text("@prompt:review").await, "Review carefully.");
    }

    #[tokio::test]
    async fn test_file_and_directory_references() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "buy milk").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("a.md"), "# A").unwrap();

        let r = resolver(dir.path());
        let out = r.process_text("summarize @notes.txt please").await;
        assert!(out.starts_with("summarize File notes.txt:"));
        assert!(out.contains("buy milk"));
        assert!(out.ends_with(" please"));

        let listing = r.process_text("@docs").await;
        assert!(listing.contains("- a.md"));
    }

    #[tokio::test]
    async fn test_unresolved_and_embedded_markers_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());

        let text = "mail bob@example.com about @missing.txt and @template:nope";
        assert_eq!(r.process_text(text).await, text);
    }

    #[tokio::test]
    async fn test_conversation_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("convos"));
        store
            .save(
                "standup",
                ProviderKind::Gemini,
                &[Turn::user("what did we ship?"), Turn::assistant("the parser")],
            )
            .unwrap();

        let r = resolver(dir.path()).with_convo_turns(1);
        let out = r.process_text("recap @convo:standup").await;
        assert!(out.contains("assistant: the parser"));
        assert!(!out.contains("what did we ship"));
    }

    #[tokio::test]
    async fn test_conversation_reference_uses_newest_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("convos"));
        store
            .save(
                "chat",
                ProviderKind::Anthropic,
                &[Turn::user("old"), Turn::assistant("OLD")],
            )
            .unwrap();
        store
            .save(
                "chat",
                ProviderKind::OpenAi,
                &[
                    Turn::user("old"),
                    Turn::assistant("OLD"),
                    Turn::user("again"),
                    Turn::assistant("NEWEST"),
                ],
            )
            .unwrap();
        // "anthropic" sorts first, so make it strictly older as well
        std::fs::File::options()
            .write(true)
            .open(store.path_for("chat", ProviderKind::Anthropic).unwrap())
            .unwrap()
            .set_modified(std::time::SystemTime::now() - std::time::Duration::from_secs(60))
            .unwrap();

        let out = resolver(dir.path()).process_text("@convo:chat").await;
        assert!(out.contains("assistant: NEWEST"));
    }

    #[tokio::test]
    async fn test_oversized_file_left_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "0123456789").unwrap();
        std::fs::write(dir.path().join("small.txt"), "ok").unwrap();

        let r = resolver(dir.path()).with_max_file_bytes(4);
        let out = r.process_text("@big.txt and @small.txt").await;
        assert!(out.starts_with("@big.txt and File small.txt:"));
        assert!(!out.contains("0123456789"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_io_failure_returns_original() {
        let dir = tempfile::tempdir().unwrap();
        // A non-UTF-8 file makes read_to_string fail
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let r = resolver(dir.path());

        let text = "@template:review and @blob.bin";
        assert_eq!(r.process_text(text).await, text);
    }
}
