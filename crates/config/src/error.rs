use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more required variables are unset or empty.
    #[error("missing required environment variable(s): {}", vars.join(", "))]
    Missing { vars: Vec<&'static str> },

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl Error {
    #[must_use]
    pub fn invalid(var: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Invalid {
            var,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
