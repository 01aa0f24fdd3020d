//! Discord event handler for serenity.
//!
//! Converts gateway messages into [`InboundMessage`]s and hands them to the
//! chat service, keeping the typing indicator up while an addressed message
//! is processed.

use std::sync::{Arc, RwLock};

use {
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Message, MessageType, Ready, User, UserId},
        async_trait,
    },
    tracing::{debug, info},
};

use {
    shion_channels::{InboundAttachment, InboundMessage, MessageKind},
    shion_chat::{ChatService, Outcome},
    shion_common::Speaker,
};

use crate::outbound::DiscordOutbound;

/// Handler for Discord gateway events.
pub struct DiscordHandler {
    service: Arc<ChatService>,
    /// The bot's own identity, known once `ready` fired.
    bot: RwLock<Option<(UserId, Speaker)>>,
}

impl DiscordHandler {
    pub fn new(service: Arc<ChatService>) -> Self {
        Self {
            service,
            bot: RwLock::new(None),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn bot(&self) -> Option<(UserId, Speaker)> {
        self.bot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let speaker = Speaker::new(
            ready.user.id.to_string(),
            display_name(None, ready.user.global_name.as_deref(), &ready.user.name),
        );
        info!(
            bot_id = %speaker.id,
            bot_name = %speaker.display_name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        *self.bot.write().unwrap_or_else(|e| e.into_inner()) = Some((ready.user.id, speaker));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some((bot_id, bot)) = self.bot() else {
            debug!(message_id = %msg.id, "message before ready, skipping");
            return;
        };

        let inbound = to_inbound(&msg, bot_id);
        if inbound.from_self || !inbound.kind.is_conversational() {
            return;
        }

        // The indicator stops when the handle is dropped.
        let _typing = inbound
            .addressed
            .then(|| msg.channel_id.start_typing(&ctx.http));

        let outbound = DiscordOutbound::new(Arc::clone(&ctx.http));
        let outcome = self
            .service
            .handle_and_relay(&bot, &inbound, &outbound)
            .await;
        if let Outcome::Reply(text) = outcome {
            debug!(
                channel_id = %inbound.channel_id,
                reply_len = text.chars().count(),
                "reply relayed"
            );
        }
    }
}

/// Normalize a serenity message.
fn to_inbound(msg: &Message, bot_id: UserId) -> InboundMessage {
    let author_name = display_name(
        msg.member.as_ref().and_then(|m| m.nick.as_deref()),
        msg.author.global_name.as_deref(),
        &msg.author.name,
    );

    InboundMessage {
        message_id: msg.id.to_string(),
        channel_id: msg.channel_id.to_string(),
        author: Speaker::new(msg.author.id.to_string(), author_name),
        from_self: msg.author.id == bot_id,
        kind: message_kind(msg.kind),
        addressed: msg.mentions.iter().any(|u| u.id == bot_id),
        text: resolve_mentions(&msg.content, &mention_names(&msg.mentions)),
        attachments: msg
            .attachments
            .iter()
            .map(|a| InboundAttachment {
                id: a.id.to_string(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
                url: a.url.clone(),
            })
            .collect(),
    }
}

fn message_kind(kind: MessageType) -> MessageKind {
    match kind {
        MessageType::Regular => MessageKind::Default,
        MessageType::InlineReply => MessageKind::Reply,
        _ => MessageKind::Other,
    }
}

/// Member nickname > global display name > username.
fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    nick.or(global_name).unwrap_or(username).to_string()
}

fn mention_names(users: &[User]) -> Vec<(String, String)> {
    users
        .iter()
        .map(|u| {
            let nick = u.member.as_ref().and_then(|m| m.nick.as_deref());
            (
                u.id.to_string(),
                display_name(nick, u.global_name.as_deref(), &u.name),
            )
        })
        .collect()
}

/// Replace raw mention syntax (`<@ID>` and `<@!ID>`) with `@display_name`.
fn resolve_mentions(content: &str, mentions: &[(String, String)]) -> String {
    let mut resolved = content.to_string();
    for (id, name) in mentions {
        let readable = format!("@{name}");
        resolved = resolved
            .replace(&format!("<@{id}>"), &readable)
            .replace(&format!("<@!{id}>"), &readable);
    }
    resolved
}
