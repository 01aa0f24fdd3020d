use {async_trait::async_trait, shion_common::Speaker};

use crate::Result;

/// Platform message type, reduced to what the orchestrator filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A plain user message.
    Default,
    /// A reply to another message.
    Reply,
    /// Anything else (joins, pins, thread notices, ...).
    Other,
}

impl MessageKind {
    /// Only plain messages and replies take part in conversations.
    pub fn is_conversational(self) -> bool {
        matches!(self, Self::Default | Self::Reply)
    }
}

/// A file attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundAttachment {
    /// Platform attachment id, stable across re-deliveries.
    pub id: String,
    pub filename: String,
    pub content_type: Option<String>,
    /// Where the platform serves the bytes.
    pub url: String,
}

/// An inbound message event, already normalized by the platform adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: String,
    /// Conversation context the message belongs to; the unit of history.
    pub channel_id: String,
    pub author: Speaker,
    /// Authored by the bot itself.
    pub from_self: bool,
    pub kind: MessageKind,
    /// The bot was explicitly mentioned.
    pub addressed: bool,
    /// Message text with platform mentions resolved to display names.
    pub text: String,
    pub attachments: Vec<InboundAttachment>,
}

/// Send messages to a channel.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
    /// Send `bytes` as a file attachment named `filename`.
    async fn send_file(&self, to: &str, filename: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Fetch the bytes of an inbound attachment.
#[async_trait]
pub trait AttachmentReader: Send + Sync {
    async fn read(&self, attachment: &InboundAttachment) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_default_and_reply_are_conversational() {
        assert!(MessageKind::Default.is_conversational());
        assert!(MessageKind::Reply.is_conversational());
        assert!(!MessageKind::Other.is_conversational());
    }
}
