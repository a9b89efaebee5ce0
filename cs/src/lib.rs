//! ChatStore - durable conversation logs for mcprepl
//!
//! Persists the full ordered message history of a chat session to a JSON file,
//! rewriting the whole snapshot on every append. Conversations are bounded in
//! practice, so snapshot rewrites are preferred over deltas for
//! crash-consistency: the on-disk file is always a complete, valid history.
//!
//! The message model here matches the Anthropic Messages API wire format, so
//! the persisted log is also exactly what the model sees as history.

pub mod cli;
pub mod config;
pub mod message;
pub mod store;

pub use config::Config;
pub use message::{ContentBlock, Message, MessageContent, Role};
pub use store::{ChatLog, ChatStore, StoreError};

/// Default directory name under the user data dir
pub const DEFAULT_APP_DIR: &str = "mcprepl";
