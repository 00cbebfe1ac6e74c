//! Conversations
//!
//! Stored transcripts, wire-format detection and cross-provider conversion.
//!
//! - `format`: structural format detection and the compatibility rule
//! - `convert`: canonical decode/encode for every provider
//! - `store`: per-provider files with in-place conversion and migration

mod convert;
mod format;
mod store;

pub use convert::{convert_messages, decode_messages, encode_messages};
pub use format::{detect_format, is_compatible};
pub use store::{ConversationEntry, ConversationStore};
