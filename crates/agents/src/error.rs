use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("{context}: HTTP {status}: {body}")]
    Api {
        context: String,
        status: u16,
        body: String,
    },

    /// The service answered but the payload is unusable.
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl std::fmt::Display) -> Self {
        Self::Message {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn api(context: impl Into<String>, status: reqwest::StatusCode, body: String) -> Self {
        Self::Api {
            context: context.into(),
            status: status.as_u16(),
            body,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
