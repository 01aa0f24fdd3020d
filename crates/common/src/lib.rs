//! Shared conversation types used across all shion crates.

pub mod types;

pub use types::{Content, Part, Role, Speaker, UploadedFile};
