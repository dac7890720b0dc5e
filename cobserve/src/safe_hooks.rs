use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use cchat::{ContextBuildHooks, ContextBuildSummary, ContextError, StreamError, StreamHooks};
use cprovider::{FinishReason, ResourceKind, StreamingPart};
use uuid::Uuid;

/// Runs an inner [`ContextBuildHooks`] and drops any panic it raises.
pub struct SafeContextHooks<H> {
    inner: H,
}

impl<H> SafeContextHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ContextBuildHooks for SafeContextHooks<H>
where
    H: ContextBuildHooks,
{
    fn on_build_start(&self, session_id: Uuid, message_count: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_build_start(session_id, message_count)
        }));
    }

    fn on_message_excluded(&self, session_id: Uuid, message_id: Uuid) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_message_excluded(session_id, message_id)
        }));
    }

    fn on_resource_resolved(
        &self,
        session_id: Uuid,
        message_id: Uuid,
        source: ResourceKind,
        length_bytes: Option<u64>,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_resource_resolved(session_id, message_id, source, length_bytes, elapsed)
        }));
    }

    fn on_build_success(
        &self,
        session_id: Uuid,
        summary: &ContextBuildSummary,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_build_success(session_id, summary, elapsed)
        }));
    }

    fn on_build_failure(&self, session_id: Uuid, error: &ContextError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_build_failure(session_id, error, elapsed)
        }));
    }

    fn on_build_cancelled(&self, session_id: Uuid, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_build_cancelled(session_id, elapsed)
        }));
    }
}

/// Runs an inner [`StreamHooks`] and drops any panic it raises.
pub struct SafeStreamHooks<H> {
    inner: H,
}

impl<H> SafeStreamHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> StreamHooks for SafeStreamHooks<H>
where
    H: StreamHooks,
{
    fn on_part_received(&self, part: &StreamingPart) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_part_received(part)));
    }

    fn on_stream_completed(
        &self,
        message_id: Uuid,
        finish_reason: &FinishReason,
        tool_calls: usize,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_stream_completed(message_id, finish_reason, tool_calls, elapsed)
        }));
    }

    fn on_stream_failed(&self, error: &StreamError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_stream_failed(error, elapsed)
        }));
    }

    fn on_stream_cancelled(&self, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_stream_cancelled(elapsed)));
    }
}
