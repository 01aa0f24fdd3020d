//! Conversation orchestration: attachment upload, message assembly, history
//! bookkeeping and reply relay.

pub mod assembler;
pub mod error;
pub mod locks;
pub mod service;
pub mod uploader;

#[cfg(test)]
mod testing;

pub use {
    assembler::assemble,
    error::{Error, Result},
    locks::ChannelLocks,
    service::{ChatService, FALLBACK_NOTICE, Outcome},
    uploader::AttachmentUploader,
};
