use std::num::NonZeroUsize;

use {secrecy::Secret, tracing::debug};

use crate::{
    error::{Error, Result},
    schema::{
        DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_HISTORY_MAX_LEN, DEFAULT_PROMPT,
        DiscordConfig, GeminiConfig, ShionConfig,
    },
};

pub const DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const DISCORD_HISTORY_MAX_LEN: &str = "DISCORD_HISTORY_MAX_LEN";
pub const DISCORD_ERROR_DETAILS: &str = "DISCORD_ERROR_DETAILS";
pub const GEMINI_TOKEN: &str = "GEMINI_TOKEN";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const GEMINI_PROMPT: &str = "GEMINI_PROMPT";
pub const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";

/// Proxy variables, checked in order.
const PROXY_VARS: &[&str] = &["https_proxy", "HTTPS_PROXY"];

/// Load config from the process environment.
pub fn from_env() -> Result<ShionConfig> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Load config using a custom lookup function.
///
/// This is the implementation used by [`from_env`]; the separate signature
/// makes it testable without mutating the process environment. Empty values
/// are treated as unset. All missing required variables are reported at once.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ShionConfig> {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let discord_token = get(DISCORD_TOKEN);
    let gemini_token = get(GEMINI_TOKEN);
    let missing: Vec<&'static str> = [
        (DISCORD_TOKEN, discord_token.is_none()),
        (GEMINI_TOKEN, gemini_token.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    let (Some(discord_token), Some(gemini_token)) = (discord_token, gemini_token) else {
        return Err(Error::Missing { vars: missing });
    };

    let history_max_len = match get(DISCORD_HISTORY_MAX_LEN) {
        Some(raw) => parse_history_len(&raw)?,
        None => NonZeroUsize::new(DEFAULT_HISTORY_MAX_LEN)
            .ok_or_else(|| Error::invalid(DISCORD_HISTORY_MAX_LEN, "default must be positive"))?,
    };

    let error_details = match get(DISCORD_ERROR_DETAILS) {
        Some(raw) => parse_bool(DISCORD_ERROR_DETAILS, &raw)?,
        None => false,
    };

    let proxy = PROXY_VARS.iter().find_map(|&name| get(name));

    let config = ShionConfig {
        proxy,
        discord: DiscordConfig {
            token: Secret::new(discord_token),
            history_max_len,
            error_details,
        },
        gemini: GeminiConfig {
            token: Secret::new(gemini_token),
            model: get(GEMINI_MODEL).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            base_url: get(GEMINI_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            prompt: get(GEMINI_PROMPT).unwrap_or_else(|| DEFAULT_PROMPT.into()),
        },
    };

    debug!(
        model = %config.gemini.model,
        history_max_len = config.discord.history_max_len.get(),
        proxy = config.proxy.is_some(),
        "loaded config from environment"
    );

    Ok(config)
}

/// Capacity must be a positive integer; zero would evict every entry on insert.
fn parse_history_len(raw: &str) -> Result<NonZeroUsize> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|e| Error::invalid(DISCORD_HISTORY_MAX_LEN, format!("{raw:?}: {e}")))?;
    NonZeroUsize::new(value)
        .ok_or_else(|| Error::invalid(DISCORD_HISTORY_MAX_LEN, "must be at least 1"))
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::invalid(var, format!("expected a boolean, got {other:?}"))),
    }
}
