//! Conversation data shared by the history store, the generation client and
//! the chat orchestrator.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic piece of a message sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Inline text.
    Text { text: String },
    /// Reference to a file previously uploaded to the content service.
    File { uri: String, mime_type: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// File reference pointing at an uploaded file's remote URI.
    pub fn file(file: &UploadedFile) -> Self {
        Self::File {
            uri: file.uri.clone(),
            mime_type: file.mime_type.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::File { .. } => None,
        }
    }
}

/// Role + parts projection of a conversation turn, as fed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }
}

/// A file held by the remote content service on behalf of one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Remote resource name (e.g. `files/1234`), used for deletion.
    pub name: String,
    /// URI the model uses to reference the file.
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
    /// Stable key of the source attachment on the chat platform.
    pub key: String,
}

/// A human author or the bot itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub display_name: String,
}

impl Speaker {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
