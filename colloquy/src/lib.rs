//! Unified facade over the colloquy workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core colloquy crates and provides convenience utilities
//! and macros for building sessions and wiring a chat service.
//!
//! ```rust
//! use colloquy::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let session = cq_session![
//!     system => "You are terse.",
//!     user => "Explain monads.",
//! ]
//! .expect("session");
//! let parameters = InferenceParameters::builder()
//!     .system_prompt_override("Be verbose.")
//!     .build()
//!     .expect("parameters");
//!
//! let context = RequestContextBuilder::default()
//!     .build(&session, &parameters, &CancellationToken::new())
//!     .await
//!     .expect("context");
//! assert_eq!(context.system_prompt(), Some("Be verbose."));
//! assert_eq!(context.messages().len(), 1);
//! # });
//! ```

mod macros;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use cchat;
pub use ccommon;
pub use cobserve;
pub use cprovider;

pub use cchat::{
    ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatService, ChatServiceBuilder,
    ChatTurn, ContextBuildHooks, ContextBuildSummary, ContextBuilderOptions, ContextError,
    ContextErrorKind, FileSystemResourceResolver, NoopContextBuildHooks, NoopStreamHooks,
    ReassembledMessage, ReassemblerState, ReassemblyDriver, ReassemblyStep, RequestContextBuilder,
    ResolverConfig, ResourceError, ResourceErrorKind, ResourceResolver, StreamError,
    StreamErrorKind, StreamHooks, StreamReassembler, reassemble,
};
pub use ccommon::{BoxFuture, CancellationToken, Cancelled, MetadataMap, cancellable};
pub use cobserve::{
    MetricsObservabilityHooks, SafeContextHooks, SafeStreamHooks, TracingObservabilityHooks,
};
pub use cprovider::{
    BoxedPartStream, ClientRegistry, CompletionClient, ContentPart, FinishReason,
    InferenceParameters, InferenceParametersBuilder, MediaPart, Message, MessageContextOverride,
    Modality, PartStream, ProviderClient, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, RequestContext, ResourceKind, ResourceRef, ResponseFormat, Role, Session,
    StreamingClient, StreamingPart, ToolCallRequest, ToolCatalog, ToolChoice, ToolDefinition,
    ToolResultPart, ValidationError, ValidationErrorKind, VecPartStream,
};

pub use runtime::{Observability, RuntimeOptions, chat_service, chat_service_with, context_builder};
pub use util::{
    assistant_message, parse_provider_id, session, system_message, tool_result_message,
    user_message,
};

#[cfg(test)]
mod tests {
    use crate::{ContentPart, Role};

    #[test]
    fn cq_msg_macro_creates_expected_message() {
        let message = crate::cq_msg!(user => "hello");
        assert_eq!(message.role(), Role::User);
        assert_eq!(message.parts(), &[ContentPart::text("hello")]);
    }

    #[test]
    fn cq_messages_macro_builds_message_vector() {
        let messages = crate::cq_messages![
            system => "You are concise.",
            user => "Summarize the repo",
        ];

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), Role::System);
        assert_eq!(messages[1].role(), Role::User);
    }

    #[test]
    fn cq_session_macro_appends_in_order() {
        let session = crate::cq_session![
            system => "You are concise and technical.",
            user => "hi",
            assistant => "hello",
        ]
        .expect("session");

        let roles = session
            .messages()
            .iter()
            .map(|message| message.role())
            .collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert!(crate::cq_session![].expect("empty").is_empty());
    }
}
