//! Chat-platform seam.
//!
//! A platform (Discord) converts its events into [`InboundMessage`] and
//! implements [`ChannelOutbound`] and [`AttachmentReader`]; the chat
//! orchestrator only talks to these traits.

pub mod error;
pub mod outbound;
pub mod plugin;

pub use {
    error::{Error, Result},
    outbound::{MAX_MESSAGE_LEN, REPLY_FILENAME, deliver_reply},
    plugin::{AttachmentReader, ChannelOutbound, InboundAttachment, InboundMessage, MessageKind},
};
