//! Production-friendly observability hooks for context builds and stream reassembly.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cchat::RequestContextBuilder;
//! use cobserve::{MetricsObservabilityHooks, SafeContextHooks, TracingObservabilityHooks};
//!
//! let _builder = RequestContextBuilder::default()
//!     .with_hooks(Arc::new(SafeContextHooks::new(TracingObservabilityHooks)));
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

use cprovider::StreamingPart;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeContextHooks, SafeStreamHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeContextHooks, SafeStreamHooks, TracingObservabilityHooks,
    };
}

fn part_kind(part: &StreamingPart) -> &'static str {
    match part {
        StreamingPart::TextDelta(_) => "text_delta",
        StreamingPart::ToolCallStart { .. } => "tool_call_start",
        StreamingPart::ToolCallArgumentDelta { .. } => "tool_call_argument_delta",
        StreamingPart::StreamEnd(_) => "stream_end",
    }
}
