use thiserror::Error;

/// Reasons a chat message is refused before it reaches the pipeline.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("chat message must not be blank")]
    EmptyMessage,
    #[error("chat message exceeds {max_chars} characters")]
    MessageTooLong { max_chars: usize },
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "empty_message",
            Self::MessageTooLong { .. } => "message_too_long",
        }
    }

    pub fn reject(self, correlation_id: impl Into<String>) -> RejectedRequest {
        RejectedRequest { reason: self, correlation_id: correlation_id.into() }
    }
}

/// A refused request as reported to HTTP callers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("request {correlation_id} rejected: {reason}")]
pub struct RejectedRequest {
    pub reason: DomainError,
    pub correlation_id: String,
}

impl RejectedRequest {
    pub fn user_message(&self) -> &'static str {
        match self.reason {
            DomainError::EmptyMessage => "Pesannya kosong. Tulis sesuatu dulu ya~",
            DomainError::MessageTooLong { .. } => "Pesannya kepanjangan. Coba dipersingkat ya~",
        }
    }
}

/// Trims `message` and enforces the non-blank and length rules.
pub fn validate_message(message: &str, max_chars: usize) -> Result<&str, DomainError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyMessage);
    }
    if trimmed.chars().count() > max_chars {
        return Err(DomainError::MessageTooLong { max_chars });
    }
    Ok(trimmed)
}
