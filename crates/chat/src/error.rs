use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading or uploading an attachment failed; nothing was recorded.
    #[error("failed to upload attachment {filename}: {source}")]
    Upload {
        filename: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The generation call failed or produced no usable reply.
    #[error("generation failed: {0}")]
    Generation(#[source] shion_agents::Error),

    /// The reply could not be delivered to the channel.
    #[error("failed to relay reply: {0}")]
    Relay(#[source] shion_channels::Error),
}

impl Error {
    #[must_use]
    pub fn upload(
        filename: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Upload {
            filename: filename.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
