//! Shared provider and validation error kinds and error value helpers.
//!
//! ```rust
//! use cprovider::{ProviderError, ValidationError, ValidationErrorKind};
//!
//! let auth = ProviderError::authentication("bad key");
//! assert!(!auth.retryable);
//!
//! let timeout = ProviderError::timeout("temporary timeout");
//! assert!(timeout.retryable);
//!
//! let duplicate = ValidationError::duplicate_tool_name("lookup");
//! assert_eq!(duplicate.kind, ValidationErrorKind::DuplicateToolName);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use ccommon::Cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Cancelled,
    Other,
}

/// Failure reported by a provider adapter behind the client contracts.
///
/// `retryable` is a hint for the caller; nothing in this workspace retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn cancelled() -> Self {
        Self::new(ProviderErrorKind::Cancelled, "provider call cancelled", false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ProviderErrorKind::Cancelled
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

impl From<Cancelled> for ProviderError {
    fn from(_: Cancelled) -> Self {
        Self::cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    ModalityMismatch,
    InvalidJson,
    InvalidToolDefinition,
    DuplicateToolName,
    DuplicateToolCallId,
    DuplicateMessageId,
    UnknownMessage,
    InvalidToolChoice,
    InvalidResponseFormat,
    InvalidParameter,
}

/// Construction-time rejection of a malformed model value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn modality_mismatch(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::ModalityMismatch, message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidJson, message)
    }

    pub fn invalid_tool_definition(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidToolDefinition, message)
    }

    pub fn duplicate_tool_name(function_name: &str) -> Self {
        Self::new(
            ValidationErrorKind::DuplicateToolName,
            format!("tool '{function_name}' is already defined in the catalog"),
        )
    }

    pub fn duplicate_tool_call_id(tool_call_id: &str) -> Self {
        Self::new(
            ValidationErrorKind::DuplicateToolCallId,
            format!("tool call id '{tool_call_id}' appears more than once in the message"),
        )
    }

    pub fn duplicate_message_id(message_id: impl Display) -> Self {
        Self::new(
            ValidationErrorKind::DuplicateMessageId,
            format!("message '{message_id}' is already part of the session"),
        )
    }

    pub fn unknown_message(message_id: impl Display) -> Self {
        Self::new(
            ValidationErrorKind::UnknownMessage,
            format!("message '{message_id}' is not part of the session"),
        )
    }

    pub fn invalid_tool_choice(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidToolChoice, message)
    }

    pub fn invalid_response_format(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidResponseFormat, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::InvalidParameter, message)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ValidationError {}

impl From<ValidationError> for ProviderError {
    fn from(value: ValidationError) -> Self {
        ProviderError::invalid_request(value.to_string())
    }
}
