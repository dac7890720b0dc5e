//! Tracing-based observability hooks for context builds and stream reassembly.
//!
//! ```rust
//! use cchat::{ContextBuildHooks, StreamHooks};
//! use cobserve::TracingObservabilityHooks;
//!
//! fn accepts_hooks(_context: &dyn ContextBuildHooks, _stream: &dyn StreamHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_hooks(&hooks, &hooks);
//! ```

use std::time::Duration;

use cchat::{ContextBuildHooks, ContextBuildSummary, ContextError, StreamError, StreamHooks};
use cprovider::{FinishReason, ResourceKind, StreamingPart};
use uuid::Uuid;

use crate::part_kind;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ContextBuildHooks for TracingObservabilityHooks {
    fn on_build_start(&self, session_id: Uuid, message_count: usize) {
        tracing::info!(
            phase = "context",
            event = "build_start",
            session_id = %session_id,
            message_count
        );
    }

    fn on_message_excluded(&self, session_id: Uuid, message_id: Uuid) {
        tracing::debug!(
            phase = "context",
            event = "message_excluded",
            session_id = %session_id,
            message_id = %message_id
        );
    }

    fn on_resource_resolved(
        &self,
        session_id: Uuid,
        message_id: Uuid,
        source: ResourceKind,
        length_bytes: Option<u64>,
        elapsed: Duration,
    ) {
        tracing::debug!(
            phase = "context",
            event = "resource_resolved",
            session_id = %session_id,
            message_id = %message_id,
            source = ?source,
            length_bytes,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_build_success(
        &self,
        session_id: Uuid,
        summary: &ContextBuildSummary,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "context",
            event = "build_success",
            session_id = %session_id,
            retained_messages = summary.retained_messages,
            excluded_messages = summary.excluded_messages,
            replaced_messages = summary.replaced_messages,
            resolved_resources = summary.resolved_resources,
            has_system_prompt = summary.has_system_prompt,
            tool_count = summary.tool_count,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_build_failure(&self, session_id: Uuid, error: &ContextError, elapsed: Duration) {
        tracing::error!(
            phase = "context",
            event = "build_failure",
            session_id = %session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            resource_error_kind = ?error.resource.as_ref().map(|resource| resource.kind),
            location = error.resource.as_ref().and_then(|resource| resource.location.as_deref()),
            error = %error
        );
    }

    fn on_build_cancelled(&self, session_id: Uuid, elapsed: Duration) {
        tracing::info!(
            phase = "context",
            event = "build_cancelled",
            session_id = %session_id,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}

impl StreamHooks for TracingObservabilityHooks {
    fn on_part_received(&self, part: &StreamingPart) {
        tracing::trace!(phase = "stream", event = "part_received", part = part_kind(part));
    }

    fn on_stream_completed(
        &self,
        message_id: Uuid,
        finish_reason: &FinishReason,
        tool_calls: usize,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "stream",
            event = "completed",
            message_id = %message_id,
            finish_reason = %finish_reason,
            tool_calls,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_stream_failed(&self, error: &StreamError, elapsed: Duration) {
        tracing::error!(
            phase = "stream",
            event = "failed",
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            protocol_violation = error.is_protocol_violation(),
            tool_call_id = error.tool_call_id.as_deref(),
            error = %error
        );
    }

    fn on_stream_cancelled(&self, elapsed: Duration) {
        tracing::info!(
            phase = "stream",
            event = "cancelled",
            elapsed_ms = elapsed.as_millis() as u64
        );
    }
}
