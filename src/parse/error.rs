use thiserror::Error;

/// Malformed configuration or keystring text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid style text: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
