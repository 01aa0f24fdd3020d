/// Config schema types (discord, gemini, network).
use std::num::NonZeroUsize;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
};

pub const DEFAULT_HISTORY_MAX_LEN: usize = 10;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Persona used when `GEMINI_PROMPT` is not set.
pub const DEFAULT_PROMPT: &str = "You are Shion, a friendly and concise assistant taking part in \
a Discord conversation with several people. Every user turn starts with a tag of the form \
user(name=<name>, id=<id>) that tells you who is speaking; use it to tell people apart and \
address them by name, but never repeat the tag in your replies. Files and images shared in the \
conversation are attached to the turn that shared them.";

/// Root configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ShionConfig {
    /// Proxy URL applied to both the Discord and the Gemini HTTP clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    pub discord: DiscordConfig,
    pub gemini: GeminiConfig,
}

/// Discord bot settings.
#[derive(Clone, Serialize)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_redacted")]
    pub token: Secret<String>,

    /// Conversation entries remembered per channel (user and model turns).
    pub history_max_len: NonZeroUsize,

    /// Append the error text to the fallback notice sent on failures.
    pub error_details: bool,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("history_max_len", &self.history_max_len)
            .field("error_details", &self.error_details)
            .finish()
    }
}

/// Gemini API settings.
#[derive(Clone, Serialize)]
pub struct GeminiConfig {
    #[serde(serialize_with = "serialize_redacted")]
    pub token: Secret<String>,

    /// Model ID (e.g. "gemini-2.0-flash").
    pub model: String,

    /// API root, without the `/v1beta` suffix.
    pub base_url: String,

    /// System instruction sent with every generation call.
    pub prompt: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("token", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn serialize_redacted<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if secret.expose_secret().is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("[REDACTED]")
    }
}

impl ShionConfig {
    /// JSON dump with secrets redacted, for `shion config`.
    pub fn to_redacted_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
