//! Request-time chat orchestration for colloquy.
//!
//! This crate turns a stored [`cprovider::Session`] into a provider-ready
//! [`cprovider::RequestContext`], reassembles streamed provider output into a single assistant
//! message, and closes the loop through [`ChatService`].
//!
//! ```rust
//! use cchat::prelude::*;
//!
//! let builder = RequestContextBuilder::default()
//!     .with_options(ContextBuilderOptions::default().with_max_concurrent_resolutions(2));
//! assert_eq!(builder.options().max_concurrent_resolutions, 2);
//! ```

mod builder;
mod error;
mod hooks;
mod reassembler;
mod resolver;
mod service;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatService, ChatServiceBuilder,
        ChatTurn, ContextBuildHooks, ContextBuildSummary, ContextBuilderOptions, ContextError,
        ContextErrorKind, FileSystemResourceResolver, NoopContextBuildHooks, NoopStreamHooks,
        ReassembledMessage, ReassemblerState, RequestContextBuilder, ResolverConfig,
        ResourceError, ResourceErrorKind, ResourceResolver, StreamError, StreamErrorKind,
        StreamHooks, StreamReassembler, reassemble,
    };
    pub use ccommon::CancellationToken;
}

pub use builder::{ContextBuilderOptions, RequestContextBuilder};
pub use error::{
    ChatError, ChatErrorKind, ContextError, ContextErrorKind, ResourceError, ResourceErrorKind,
    StreamError, StreamErrorKind,
};
pub use hooks::{
    ContextBuildHooks, ContextBuildSummary, NoopContextBuildHooks, NoopStreamHooks, StreamHooks,
};
pub use reassembler::{
    ReassembledMessage, ReassemblerState, ReassemblyDriver, ReassemblyStep, StreamReassembler,
    reassemble,
};
pub use resolver::{FileSystemResourceResolver, ResolverConfig, ResourceResolver};
pub use service::{ChatEvent, ChatEventStream, ChatService, ChatServiceBuilder, ChatTurn};
