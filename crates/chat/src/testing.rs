//! In-memory doubles for the generation service and the chat platform.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Mutex;

use {
    async_trait::async_trait,
    shion_agents::{FileUpload, GenerateRequest, Generation, GenerationService, Usage},
    shion_channels::{
        AttachmentReader, ChannelOutbound, InboundAttachment, InboundMessage, MessageKind,
    },
    shion_common::{Speaker, UploadedFile},
};

#[derive(Default)]
pub struct GenerationLog {
    uploads: Vec<FileUpload>,
    deleted: Vec<String>,
    delete_attempts: usize,
    requests: Vec<GenerateRequest>,
    deleted_at_generate: Vec<Vec<String>>,
}

pub struct MockGeneration {
    pub fail_upload_key: Option<String>,
    pub fail_delete: bool,
    pub fail_generate: bool,
    pub reply: String,
    pub log: Mutex<GenerationLog>,
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self {
            fail_upload_key: None,
            fail_delete: false,
            fail_generate: false,
            reply: "pong".into(),
            log: Mutex::default(),
        }
    }
}

impl MockGeneration {
    pub fn uploads(&self) -> Vec<FileUpload> {
        self.log.lock().unwrap().uploads.clone()
    }

    /// Names of successfully deleted files, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.log.lock().unwrap().deleted.clone()
    }

    pub fn delete_attempts(&self) -> usize {
        self.log.lock().unwrap().delete_attempts
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.log.lock().unwrap().requests.clone()
    }

    /// What [`Self::deleted`] held when each `generate` call started.
    pub fn deleted_at_generate(&self) -> Vec<Vec<String>> {
        self.log.lock().unwrap().deleted_at_generate.clone()
    }
}

#[async_trait]
impl GenerationService for MockGeneration {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn upload_file(&self, upload: FileUpload) -> shion_agents::Result<UploadedFile> {
        if self.fail_upload_key.as_deref() == Some(upload.key.as_str()) {
            return Err(shion_agents::Error::message("upload rejected"));
        }
        let file = UploadedFile {
            name: format!("files/{}", upload.key),
            uri: format!("https://mock/files/{}", upload.key),
            mime_type: upload.mime_type.clone(),
            display_name: upload.display_name.clone(),
            key: upload.key.clone(),
        };
        self.log.lock().unwrap().uploads.push(upload);
        Ok(file)
    }

    async fn delete_file(&self, name: &str) -> shion_agents::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.delete_attempts += 1;
        if self.fail_delete {
            return Err(shion_agents::Error::message("delete rejected"));
        }
        log.deleted.push(name.to_string());
        Ok(())
    }

    async fn generate(&self, request: GenerateRequest) -> shion_agents::Result<Generation> {
        {
            let mut log = self.log.lock().unwrap();
            let deleted = log.deleted.clone();
            log.deleted_at_generate.push(deleted);
            log.requests.push(request);
        }
        if self.fail_generate {
            return Err(shion_agents::Error::message("model unavailable"));
        }
        Ok(Generation {
            text: self.reply.clone(),
            usage: Usage::default(),
        })
    }
}

#[derive(Default)]
pub struct MockReader {
    pub fail_id: Option<String>,
}

#[async_trait]
impl AttachmentReader for MockReader {
    async fn read(&self, attachment: &InboundAttachment) -> shion_channels::Result<Vec<u8>> {
        if self.fail_id.as_deref() == Some(attachment.id.as_str()) {
            return Err(shion_channels::Error::unavailable("attachment expired"));
        }
        Ok(format!("bytes of {}", attachment.filename).into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { to: String, text: String },
    File { to: String, filename: String },
}

#[derive(Default)]
pub struct RecordingOutbound {
    pub fail: bool,
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingOutbound {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_text(&self, to: &str, text: &str) -> shion_channels::Result<()> {
        if self.fail {
            return Err(shion_channels::Error::unavailable("gateway closed"));
        }
        self.sent.lock().unwrap().push(Sent::Text {
            to: to.into(),
            text: text.into(),
        });
        Ok(())
    }

    async fn send_file(&self, to: &str, filename: &str, _bytes: Vec<u8>) -> shion_channels::Result<()> {
        if self.fail {
            return Err(shion_channels::Error::unavailable("gateway closed"));
        }
        self.sent.lock().unwrap().push(Sent::File {
            to: to.into(),
            filename: filename.into(),
        });
        Ok(())
    }
}

pub fn attachment(id: &str, filename: &str, content_type: Option<&str>) -> InboundAttachment {
    InboundAttachment {
        id: id.into(),
        filename: filename.into(),
        content_type: content_type.map(str::to_string),
        url: format!("https://cdn.example/{id}/{filename}"),
    }
}

pub fn bot() -> Speaker {
    Speaker::new("100", "Shion")
}

/// A plain message from user 7 ("Alice") in `channel_id`.
pub fn message(channel_id: &str, text: &str, addressed: bool) -> InboundMessage {
    InboundMessage {
        message_id: "m1".into(),
        channel_id: channel_id.into(),
        author: Speaker::new("7", "Alice"),
        from_self: false,
        kind: MessageKind::Default,
        addressed,
        text: text.into(),
        attachments: Vec::new(),
    }
}
