//! Chat log persistence
//!
//! A [`ChatStore`] is a directory of chat logs, one JSON file per chat
//! session. A [`ChatLog`] is the live, append-only history of one session;
//! every append rewrites the complete snapshot through a temp file + rename
//! so a crash never leaves a torn file behind.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::message::Message;

/// Unique identifier for a chat session
pub type ChatId = String;

/// Errors from chat log persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chat not found: {0}")]
    NotFound(String),
}

/// A directory of persisted chat logs
pub struct ChatStore {
    base_path: PathBuf,
}

impl ChatStore {
    /// Open or create a chat store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened chat store");
        Ok(Self { base_path })
    }

    /// Start a new chat log with a fresh id
    ///
    /// The empty history is written out immediately so the log file exists
    /// and is readable before the first turn runs.
    pub fn create(&self) -> Result<ChatLog, StoreError> {
        // v7 ids sort by creation time, so `cs list` output is chronological
        let chat_id = Uuid::now_v7().to_string();
        let path = self.log_path(&chat_id);

        let mut log = ChatLog {
            chat_id: chat_id.clone(),
            path,
            messages: Vec::new(),
        };
        log.persist()?;

        info!(chat_id, "Created chat log");
        Ok(log)
    }

    /// Load an existing chat log
    pub fn load(&self, chat_id: &str) -> Result<ChatLog, StoreError> {
        let path = self.log_path(chat_id);
        if !path.exists() {
            return Err(StoreError::NotFound(chat_id.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let messages: Vec<Message> = serde_json::from_str(&content)?;

        debug!(chat_id, message_count = messages.len(), "Loaded chat log");
        Ok(ChatLog {
            chat_id: chat_id.to_string(),
            path,
            messages,
        })
    }

    /// List all chat ids in the store
    pub fn list(&self) -> Result<Vec<ChatId>, StoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Delete a chat log
    pub fn delete(&self, chat_id: &str) -> Result<(), StoreError> {
        let path = self.log_path(chat_id);
        if !path.exists() {
            return Err(StoreError::NotFound(chat_id.to_string()));
        }
        fs::remove_file(&path)?;
        info!(chat_id, "Deleted chat log");
        Ok(())
    }

    /// The directory this store reads and writes
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn log_path(&self, chat_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", chat_id))
    }
}

/// The live message history of one chat session
pub struct ChatLog {
    chat_id: ChatId,
    path: PathBuf,
    messages: Vec<Message>,
}

impl ChatLog {
    /// Append one message and durably persist the full snapshot
    ///
    /// The message is always kept in memory; a persistence failure is
    /// returned so the caller can report it, but the conversation itself
    /// stays intact and usable.
    pub fn append(&mut self, message: Message) -> Result<(), StoreError> {
        self.messages.push(message);
        self.persist()
    }

    /// The full ordered history, for read-only consumers
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// This log's chat session id
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Path of the persisted log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        debug!(chat_id = %self.chat_id, message_count = self.messages.len(), "persist: writing snapshot");
        let content = serde_json::to_string_pretty(&self.messages)?;

        // Rename is atomic on the same filesystem, so readers and crash
        // recovery always see a complete JSON document.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
