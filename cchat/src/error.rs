//! Chat-layer errors and classification.
//!
//! Every error type carries a `Cancelled` kind so callers can tell an abandoned operation from a failed one.

use std::error::Error;
use std::fmt::{Display, Formatter};

use ccommon::Cancelled;
use cprovider::{ProviderError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceErrorKind {
    NotFound,
    AccessDenied,
    TooLarge,
    Io,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceError {
    pub kind: ResourceErrorKind,
    pub message: String,
    pub location: Option<String>,
}

impl ResourceError {
    pub fn new(kind: ResourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::NotFound, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::AccessDenied, message)
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::TooLarge, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::Io, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ResourceErrorKind::Cancelled, "resource resolution cancelled")
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ResourceErrorKind::Cancelled
    }
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{:?}: {} ({location})", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ResourceError {}

impl From<Cancelled> for ResourceError {
    fn from(_: Cancelled) -> Self {
        Self::cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextErrorKind {
    BuildFailed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub kind: ContextErrorKind,
    pub message: String,
    pub resource: Option<ResourceError>,
}

impl ContextError {
    pub fn build_failed(resource: ResourceError) -> Self {
        Self {
            kind: ContextErrorKind::BuildFailed,
            message: format!("context build failed: {resource}"),
            resource: Some(resource),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: ContextErrorKind::Cancelled,
            message: "context build cancelled".to_string(),
            resource: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ContextErrorKind::Cancelled
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.resource
            .as_ref()
            .map(|resource| resource as &(dyn Error + 'static))
    }
}

impl From<ResourceError> for ContextError {
    fn from(value: ResourceError) -> Self {
        if value.is_cancelled() {
            Self::cancelled()
        } else {
            Self::build_failed(value)
        }
    }
}

impl From<Cancelled> for ContextError {
    fn from(_: Cancelled) -> Self {
        Self::cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    DuplicateToolCallId,
    UnknownToolCallId,
    StreamAlreadyTerminated,
    Truncated,
    Provider,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub message: String,
    pub tool_call_id: Option<String>,
}

impl StreamError {
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_call_id: None,
        }
    }

    pub fn duplicate_tool_call_id(tool_call_id: &str) -> Self {
        Self::new(
            StreamErrorKind::DuplicateToolCallId,
            format!("tool call '{tool_call_id}' was already started in this stream"),
        )
        .with_tool_call_id(tool_call_id)
    }

    pub fn unknown_tool_call_id(tool_call_id: &str) -> Self {
        Self::new(
            StreamErrorKind::UnknownToolCallId,
            format!("argument delta for tool call '{tool_call_id}' arrived before its start"),
        )
        .with_tool_call_id(tool_call_id)
    }

    pub fn already_terminated() -> Self {
        Self::new(
            StreamErrorKind::StreamAlreadyTerminated,
            "streaming part received after the stream terminated",
        )
    }

    pub fn truncated() -> Self {
        Self::new(
            StreamErrorKind::Truncated,
            "stream ended without a terminal part",
        )
    }

    pub fn provider(error: &ProviderError) -> Self {
        Self::new(StreamErrorKind::Provider, error.to_string())
    }

    pub fn cancelled() -> Self {
        Self::new(StreamErrorKind::Cancelled, "stream consumption cancelled")
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == StreamErrorKind::Cancelled
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self.kind,
            StreamErrorKind::DuplicateToolCallId
                | StreamErrorKind::UnknownToolCallId
                | StreamErrorKind::StreamAlreadyTerminated
                | StreamErrorKind::Truncated
        )
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for StreamError {}

impl From<ProviderError> for StreamError {
    fn from(value: ProviderError) -> Self {
        if value.is_cancelled() {
            Self::cancelled()
        } else {
            Self::provider(&value)
        }
    }
}

impl From<Cancelled> for StreamError {
    fn from(_: Cancelled) -> Self {
        Self::cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    NotConfigured,
    Context,
    Stream,
    Provider,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::NotConfigured, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ChatErrorKind::Cancelled, "chat turn cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ChatErrorKind::Cancelled
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ValidationError> for ChatError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        if value.is_cancelled() {
            Self::cancelled()
        } else {
            Self::new(ChatErrorKind::Provider, value.to_string())
        }
    }
}

impl From<Cancelled> for ChatError {
    fn from(_: Cancelled) -> Self {
        Self::cancelled()
    }
}

impl From<ContextError> for ChatError {
    fn from(value: ContextError) -> Self {
        if value.is_cancelled() {
            Self::cancelled()
        } else {
            Self::new(ChatErrorKind::Context, value.to_string())
        }
    }
}

impl From<StreamError> for ChatError {
    fn from(value: StreamError) -> Self {
        if value.is_cancelled() {
            Self::cancelled()
        } else {
            Self::new(ChatErrorKind::Stream, value.to_string())
        }
    }
}
