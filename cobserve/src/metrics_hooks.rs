//! Metrics-based observability hooks for context builds and stream reassembly.
//!
//! ```rust
//! use cchat::StreamHooks;
//! use cobserve::MetricsObservabilityHooks;
//!
//! fn accepts_stream_hooks(_hooks: &dyn StreamHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_stream_hooks(&hooks);
//! ```

use std::time::Duration;

use cchat::{ContextBuildHooks, ContextBuildSummary, ContextError, StreamError, StreamHooks};
use cprovider::{FinishReason, ResourceKind, StreamingPart};
use uuid::Uuid;

use crate::part_kind;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ContextBuildHooks for MetricsObservabilityHooks {
    fn on_build_start(&self, _session_id: Uuid, _message_count: usize) {
        metrics::counter!("colloquy_context_build_start_total").increment(1);
    }

    fn on_message_excluded(&self, _session_id: Uuid, _message_id: Uuid) {
        metrics::counter!("colloquy_context_message_excluded_total").increment(1);
    }

    fn on_resource_resolved(
        &self,
        _session_id: Uuid,
        _message_id: Uuid,
        source: ResourceKind,
        length_bytes: Option<u64>,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "colloquy_context_resource_resolved_total",
            "source" => format!("{:?}", source)
        )
        .increment(1);
        metrics::histogram!(
            "colloquy_context_resource_resolve_duration_seconds",
            "source" => format!("{:?}", source)
        )
        .record(elapsed.as_secs_f64());

        if let Some(length) = length_bytes {
            metrics::histogram!("colloquy_context_resource_bytes").record(length as f64);
        }
    }

    fn on_build_success(
        &self,
        _session_id: Uuid,
        summary: &ContextBuildSummary,
        elapsed: Duration,
    ) {
        metrics::counter!("colloquy_context_build_success_total").increment(1);
        metrics::histogram!(
            "colloquy_context_build_duration_seconds",
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
        metrics::histogram!("colloquy_context_messages_per_build")
            .record(summary.retained_messages as f64);
    }

    fn on_build_failure(&self, _session_id: Uuid, error: &ContextError, elapsed: Duration) {
        let resource_kind = error
            .resource
            .as_ref()
            .map(|resource| format!("{:?}", resource.kind))
            .unwrap_or_else(|| "none".to_string());

        metrics::counter!(
            "colloquy_context_build_failure_total",
            "error_kind" => format!("{:?}", error.kind),
            "resource_error_kind" => resource_kind
        )
        .increment(1);
        metrics::histogram!(
            "colloquy_context_build_duration_seconds",
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_build_cancelled(&self, _session_id: Uuid, elapsed: Duration) {
        metrics::counter!("colloquy_context_build_cancelled_total").increment(1);
        metrics::histogram!(
            "colloquy_context_build_duration_seconds",
            "status" => "cancelled"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl StreamHooks for MetricsObservabilityHooks {
    fn on_part_received(&self, part: &StreamingPart) {
        metrics::counter!("colloquy_stream_parts_total", "part" => part_kind(part)).increment(1);
    }

    fn on_stream_completed(
        &self,
        _message_id: Uuid,
        finish_reason: &FinishReason,
        tool_calls: usize,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "colloquy_stream_completed_total",
            "finish_reason" => finish_reason.to_string()
        )
        .increment(1);
        metrics::histogram!("colloquy_stream_duration_seconds", "status" => "completed")
            .record(elapsed.as_secs_f64());
        metrics::histogram!("colloquy_stream_tool_calls_per_message").record(tool_calls as f64);
    }

    fn on_stream_failed(&self, error: &StreamError, elapsed: Duration) {
        metrics::counter!(
            "colloquy_stream_failed_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("colloquy_stream_duration_seconds", "status" => "failed")
            .record(elapsed.as_secs_f64());
    }

    fn on_stream_cancelled(&self, elapsed: Duration) {
        metrics::counter!("colloquy_stream_cancelled_total").increment(1);
        metrics::histogram!("colloquy_stream_duration_seconds", "status" => "cancelled")
            .record(elapsed.as_secs_f64());
    }
}
