//! Conversation orchestrator.
//!
//! [`ChatService`] is the only caller of the generation service and the only
//! writer of the history store. Each inbound event is one best-effort
//! attempt: there is no retry, and failures surface as [`Error`] values that
//! [`ChatService::handle_and_relay`] turns into a fallback notice when the
//! bot was addressed.

use std::sync::Arc;

use {
    shion_agents::{GenerateRequest, GenerationService},
    shion_channels::{AttachmentReader, ChannelOutbound, InboundMessage, deliver_reply},
    shion_common::Speaker,
    shion_sessions::{ConversationEntry, HistoryStore},
    tracing::{debug, error, info, trace, warn},
};

use crate::{
    assembler::assemble,
    error::{Error, Result},
    locks::ChannelLocks,
    uploader::AttachmentUploader,
};

/// Sent to the channel when an addressed message could not be answered.
pub const FALLBACK_NOTICE: &str = "Sorry, I encountered an error while processing your request.";

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Filtered out (own message or non-conversational kind).
    Ignored,
    /// Recorded as context; the bot was not addressed.
    Recorded,
    /// Recorded and answered; the text should be relayed.
    Reply(String),
}

pub struct ChatService {
    generation: Arc<dyn GenerationService>,
    uploader: AttachmentUploader,
    history: HistoryStore,
    locks: ChannelLocks,
    system_instruction: Option<String>,
    error_details: bool,
}

impl ChatService {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        reader: Arc<dyn AttachmentReader>,
        history: HistoryStore,
        system_instruction: Option<String>,
    ) -> Self {
        Self {
            uploader: AttachmentUploader::new(Arc::clone(&generation), reader),
            generation,
            history,
            locks: ChannelLocks::new(),
            system_instruction,
            error_details: false,
        }
    }

    /// Append the error text to fallback notices.
    #[must_use]
    pub fn with_error_details(mut self, enabled: bool) -> Self {
        self.error_details = enabled;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Process one inbound message. `bot` is the bot's own identity, used to
    /// tag recorded model turns.
    ///
    /// The user turn is recorded before the generation call; the model turn
    /// only once a reply was produced. Files evicted by the user turn are
    /// released after the call returns, whatever its result.
    pub async fn handle(&self, bot: &Speaker, msg: &InboundMessage) -> Result<Outcome> {
        if msg.from_self || !msg.kind.is_conversational() {
            trace!(message_id = %msg.message_id, kind = ?msg.kind, "message ignored");
            return Ok(Outcome::Ignored);
        }

        let _guard = self.locks.lock(&msg.channel_id).await;

        let files = self.uploader.upload_all(&msg.attachments).await?;
        let parts = assemble(&msg.author.id, &msg.author.display_name, &msg.text, &files);

        if !msg.addressed {
            self.record(&msg.channel_id, ConversationEntry::user(parts, files))
                .await;
            debug!(
                channel_id = %msg.channel_id,
                message_id = %msg.message_id,
                "recorded unaddressed message"
            );
            return Ok(Outcome::Recorded);
        }

        // Files pushed out by the user turn may still be referenced by the
        // seed history, so they are released only after the call returns.
        let history = self.history.history_for(&msg.channel_id);
        let evicted = self.history.put(
            &msg.channel_id,
            ConversationEntry::user(parts.clone(), files),
        );

        let request = GenerateRequest {
            history,
            turn: parts,
            system_instruction: self.system_instruction.clone(),
        };
        let result = self.generation.generate(request).await;
        self.release_evicted(&msg.channel_id, evicted).await;

        let generation = result.map_err(Error::Generation)?;
        if generation.text.trim().is_empty() {
            return Err(Error::Generation(shion_agents::Error::message(
                "empty reply",
            )));
        }

        info!(
            channel_id = %msg.channel_id,
            message_id = %msg.message_id,
            provider = self.generation.name(),
            model = self.generation.model(),
            input_tokens = generation.usage.input_tokens,
            output_tokens = generation.usage.output_tokens,
            reply_len = generation.text.chars().count(),
            "generated reply"
        );

        let model_parts = assemble(&bot.id, &bot.display_name, &generation.text, &[]);
        self.record(&msg.channel_id, ConversationEntry::model(model_parts))
            .await;

        Ok(Outcome::Reply(generation.text))
    }

    /// Process a message and deliver the result to its channel.
    ///
    /// Failures are logged. When the bot was addressed, upload and
    /// generation failures also send [`FALLBACK_NOTICE`] to the channel.
    pub async fn handle_and_relay(
        &self,
        bot: &Speaker,
        msg: &InboundMessage,
        outbound: &dyn ChannelOutbound,
    ) -> Outcome {
        match self.handle(bot, msg).await {
            Ok(Outcome::Reply(text)) => {
                if let Err(e) = self.relay(outbound, &msg.channel_id, &text).await {
                    warn!(channel_id = %msg.channel_id, error = %e, "reply not delivered");
                }
                Outcome::Reply(text)
            },
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    channel_id = %msg.channel_id,
                    message_id = %msg.message_id,
                    author_id = %msg.author.id,
                    error = %e,
                    "failed to handle message"
                );
                if msg.addressed {
                    let notice = self.fallback_notice(&e);
                    if let Err(e) = outbound.send_text(&msg.channel_id, &notice).await {
                        warn!(channel_id = %msg.channel_id, error = %e, "fallback notice not delivered");
                    }
                }
                Outcome::Ignored
            },
        }
    }

    async fn relay(&self, outbound: &dyn ChannelOutbound, to: &str, text: &str) -> Result<()> {
        deliver_reply(outbound, to, text)
            .await
            .map_err(Error::Relay)
    }

    fn fallback_notice(&self, err: &Error) -> String {
        if self.error_details {
            format!("{FALLBACK_NOTICE}\n```\n{err}\n```")
        } else {
            FALLBACK_NOTICE.to_string()
        }
    }

    /// Append an entry and release the files of whatever it pushed out.
    async fn record(&self, channel_id: &str, entry: ConversationEntry) {
        let evicted = self.history.put(channel_id, entry);
        self.release_evicted(channel_id, evicted).await;
    }

    async fn release_evicted(&self, channel_id: &str, evicted: Option<ConversationEntry>) {
        let Some(evicted) = evicted else {
            return;
        };
        let files = evicted.into_files();
        if !files.is_empty() {
            debug!(channel_id, count = files.len(), "releasing evicted files");
            self.uploader.release(&files).await;
        }
    }
}
