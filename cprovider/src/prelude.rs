//! Common `cprovider` imports for downstream crates.

pub use crate::{
    BoxedPartStream, ClientRegistry, CompletionClient, ContentPart, FinishReason,
    InferenceParameters, MediaPart, Message, MessageContextOverride, Modality, PartStream,
    ProviderClient, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, RequestContext,
    ResourceKind, ResourceRef, Role, Session, StreamingClient, StreamingPart, ToolCallRequest,
    ToolCatalog, ToolChoice, ToolDefinition, ValidationError, ValidationErrorKind,
};
pub use ccommon::{BoxFuture, CancellationToken, MetadataMap};
