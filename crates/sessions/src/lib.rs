//! Per-channel conversation history.
//!
//! Each channel keeps a bounded, insertion-ordered window of
//! [`ConversationEntry`] values. Appending past capacity evicts the oldest
//! entry and hands it back so the caller can release the remote files it
//! owns. Nothing is persisted: history lives for the process lifetime.

pub mod entry;
pub mod store;

pub use {entry::ConversationEntry, store::HistoryStore};
