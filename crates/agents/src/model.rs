use async_trait::async_trait;

use shion_common::{Content, Part, UploadedFile};

use crate::Result;

/// Bytes to place in the content service on behalf of one attachment.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Vec<u8>,
    pub display_name: String,
    /// Stable source key (the chat platform's attachment id).
    pub key: String,
    pub mime_type: String,
}

/// One generation call: the seeded history plus the active user turn.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Previous turns, oldest first.
    pub history: Vec<Content>,
    /// Parts of the user turn being answered.
    pub turn: Vec<Part>,
    /// Persona / system prompt.
    pub system_instruction: Option<String>,
}

/// Token accounting reported by the service, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Textual result of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
}

/// Generative-AI service used by the chat orchestrator (Gemini, or a mock in
/// tests).
#[async_trait]
pub trait GenerationService: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.0-flash").
    fn model(&self) -> &str;

    /// Store a file remotely so later turns can reference it.
    async fn upload_file(&self, upload: FileUpload) -> Result<UploadedFile>;

    /// Release a stored file by its remote resource name.
    async fn delete_file(&self, name: &str) -> Result<()>;

    /// Answer `request.turn` given `request.history`.
    async fn generate(&self, request: GenerateRequest) -> Result<Generation>;
}
