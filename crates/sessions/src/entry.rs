use shion_common::{Content, Part, Role, UploadedFile};

/// One finalized turn in a channel's conversation.
///
/// The entry owns the remote files referenced by its parts; they are released
/// when the entry is evicted from its channel's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    role: Role,
    parts: Vec<Part>,
    files: Vec<UploadedFile>,
}

impl ConversationEntry {
    pub fn new(role: Role, parts: Vec<Part>, files: Vec<UploadedFile>) -> Self {
        Self { role, parts, files }
    }

    /// A user turn together with the files uploaded for it.
    pub fn user(parts: Vec<Part>, files: Vec<UploadedFile>) -> Self {
        Self::new(Role::User, parts, files)
    }

    /// A model turn. Model output never owns files.
    pub fn model(parts: Vec<Part>) -> Self {
        Self::new(Role::Model, parts, Vec::new())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Give up ownership of the attached files (used on eviction).
    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files
    }

    /// Role + parts projection, files stripped.
    pub fn content(&self) -> Content {
        Content::new(self.role, self.parts.clone())
    }
}
