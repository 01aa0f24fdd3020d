//! Configuration loading and validation.
//!
//! Every setting comes from the process environment (a `.env` file is merged
//! in by the binary before loading). Secrets are kept in [`secrecy::Secret`]
//! and never printed.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{from_env, from_lookup},
    schema::{DiscordConfig, GeminiConfig, ShionConfig},
};
