use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::all::{ChannelId, CreateAttachment, CreateMessage, Http},
    shion_channels::{ChannelOutbound, Error, Result},
};

/// Sends messages through Discord's REST API.
pub struct DiscordOutbound {
    http: Arc<Http>,
}

impl DiscordOutbound {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel_id(to: &str) -> Result<ChannelId> {
    match to.parse::<u64>() {
        Ok(id) if id != 0 => Ok(ChannelId::new(id)),
        _ => Err(Error::invalid_input(format!("not a discord channel id: {to:?}"))),
    }
}

#[async_trait]
impl ChannelOutbound for DiscordOutbound {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        channel_id(to)?
            .send_message(&*self.http, CreateMessage::new().content(text))
            .await
            .map_err(|e| Error::external("failed to send discord message", e))?;
        Ok(())
    }

    async fn send_file(&self, to: &str, filename: &str, bytes: Vec<u8>) -> Result<()> {
        let attachment = CreateAttachment::bytes(bytes, filename);
        channel_id(to)?
            .send_message(&*self.http, CreateMessage::new().add_file(attachment))
            .await
            .map_err(|e| Error::external("failed to send discord attachment", e))?;
        Ok(())
    }
}
