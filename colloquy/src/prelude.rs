//! Common imports for most colloquy applications.

pub use crate::{
    Observability, RuntimeOptions, assistant_message, chat_service, chat_service_with,
    context_builder, parse_provider_id, session, system_message, tool_result_message,
    user_message,
};
pub use crate::{cq_messages, cq_msg, cq_session};
pub use crate::{
    BoxFuture, BoxedPartStream, CancellationToken, ChatError, ChatErrorKind, ChatEvent,
    ChatEventStream, ChatService, ChatServiceBuilder, ChatTurn, ClientRegistry, CompletionClient,
    ContentPart, ContextBuilderOptions, ContextError, FinishReason, InferenceParameters, Message,
    MessageContextOverride, Modality, ProviderClient, ProviderError, ProviderFuture, ProviderId,
    RequestContext, RequestContextBuilder, ResolverConfig, ResourceError, ResourceRef, Role,
    Session, StreamError, StreamingClient, StreamingPart, ToolCallRequest, ToolCatalog,
    ToolChoice, ToolDefinition, ValidationError,
};
