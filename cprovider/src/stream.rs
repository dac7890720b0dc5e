//! Streaming part contracts and in-memory stream utilities.
//!
//! ```rust
//! use cprovider::{BoxedPartStream, FinishReason, StreamingPart, VecPartStream};
//!
//! let stream = VecPartStream::new(vec![
//!     Ok(StreamingPart::TextDelta("hello".into())),
//!     Ok(StreamingPart::StreamEnd(FinishReason::Stop)),
//! ]);
//! let _boxed: BoxedPartStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Maps the finish/stop reason strings used by the supported providers.
    pub fn from_provider(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "stop" | "end_turn" | "stop_sequence" | "complete" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "tool_calls" | "tool_use" | "function_call" => Self::ToolCalls,
            "content_filter" | "safety" | "refusal" => Self::ContentFilter,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Other(value) => value,
        }
    }
}

impl Display for FinishReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FinishReason {
    fn from(value: &str) -> Self {
        Self::from_provider(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamingPart {
    TextDelta(String),
    ToolCallStart {
        tool_call_id: String,
        function_name: String,
    },
    ToolCallArgumentDelta {
        tool_call_id: String,
        chunk: String,
    },
    StreamEnd(FinishReason),
}

impl StreamingPart {
    pub fn text(delta: impl Into<String>) -> Self {
        Self::TextDelta(delta.into())
    }

    pub fn tool_call_start(tool_call_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self::ToolCallStart {
            tool_call_id: tool_call_id.into(),
            function_name: function_name.into(),
        }
    }

    pub fn tool_call_arguments(tool_call_id: impl Into<String>, chunk: impl Into<String>) -> Self {
        Self::ToolCallArgumentDelta {
            tool_call_id: tool_call_id.into(),
            chunk: chunk.into(),
        }
    }

    pub fn end(reason: impl Into<FinishReason>) -> Self {
        Self::StreamEnd(reason.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnd(_))
    }
}

/// Provider stream contract.
///
/// Invariants for consumers:
/// - Parts are emitted in source order and must be consumed in that order.
/// - `StreamEnd` is the last part; anything after it is a protocol violation.
/// - The stream is lazy, finite, and not restartable.
pub trait PartStream: Stream<Item = Result<StreamingPart, ProviderError>> + Send {}

impl<T> PartStream for T where T: Stream<Item = Result<StreamingPart, ProviderError>> + Send {}

pub type BoxedPartStream<'a> = Pin<Box<dyn PartStream + 'a>>;

#[derive(Debug)]
pub struct VecPartStream {
    parts: VecDeque<Result<StreamingPart, ProviderError>>,
}

impl VecPartStream {
    pub fn new(parts: Vec<Result<StreamingPart, ProviderError>>) -> Self {
        Self {
            parts: parts.into(),
        }
    }

    pub fn from_parts(parts: impl IntoIterator<Item = StreamingPart>) -> Self {
        Self::new(parts.into_iter().map(Ok).collect())
    }
}

impl Stream for VecPartStream {
    type Item = Result<StreamingPart, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamingPart, ProviderError>>> {
        Poll::Ready(self.parts.pop_front())
    }
}
