//! Hook contracts for observing context builds and stream reassembly.
//!
//! ```rust
//! use cchat::{ContextBuildHooks, NoopContextBuildHooks, NoopStreamHooks, StreamHooks};
//!
//! fn accepts_hooks(_context: &dyn ContextBuildHooks, _stream: &dyn StreamHooks) {}
//!
//! accepts_hooks(&NoopContextBuildHooks, &NoopStreamHooks);
//! ```

use std::time::Duration;

use cprovider::{FinishReason, ResourceKind, StreamingPart};
use uuid::Uuid;

use crate::{ContextError, StreamError};

/// Counts describing one successful context build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextBuildSummary {
    pub retained_messages: usize,
    pub excluded_messages: usize,
    pub replaced_messages: usize,
    /// Media references the resolver rewrote. Pass-through references are not counted.
    pub resolved_resources: usize,
    pub has_system_prompt: bool,
    pub tool_count: usize,
}

pub trait ContextBuildHooks: Send + Sync {
    fn on_build_start(&self, _session_id: Uuid, _message_count: usize) {}

    fn on_message_excluded(&self, _session_id: Uuid, _message_id: Uuid) {}

    fn on_resource_resolved(
        &self,
        _session_id: Uuid,
        _message_id: Uuid,
        _source: ResourceKind,
        _length_bytes: Option<u64>,
        _elapsed: Duration,
    ) {
    }

    fn on_build_success(
        &self,
        _session_id: Uuid,
        _summary: &ContextBuildSummary,
        _elapsed: Duration,
    ) {
    }

    fn on_build_failure(&self, _session_id: Uuid, _error: &ContextError, _elapsed: Duration) {}

    fn on_build_cancelled(&self, _session_id: Uuid, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContextBuildHooks;

impl ContextBuildHooks for NoopContextBuildHooks {}

pub trait StreamHooks: Send + Sync {
    fn on_part_received(&self, _part: &StreamingPart) {}

    fn on_stream_completed(
        &self,
        _message_id: Uuid,
        _finish_reason: &FinishReason,
        _tool_calls: usize,
        _elapsed: Duration,
    ) {
    }

    fn on_stream_failed(&self, _error: &StreamError, _elapsed: Duration) {}

    fn on_stream_cancelled(&self, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStreamHooks;

impl StreamHooks for NoopStreamHooks {}
