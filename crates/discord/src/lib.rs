//! Discord adapter: gateway events in, replies and files out.

pub mod attachments;
pub mod client;
pub mod handler;
pub mod outbound;

pub use {
    attachments::HttpAttachmentReader, client::start, handler::DiscordHandler,
    outbound::DiscordOutbound,
};
