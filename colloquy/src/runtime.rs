//! Runtime wiring helpers for chat usage.

use std::sync::Arc;

use crate::{
    ChatError, ChatService, ClientRegistry, ContextBuildHooks, ContextBuilderOptions,
    FileSystemResourceResolver, MetricsObservabilityHooks, NoopContextBuildHooks, NoopStreamHooks,
    ProviderId, RequestContextBuilder, ResolverConfig, SafeContextHooks, SafeStreamHooks,
    StreamHooks, TracingObservabilityHooks,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Observability {
    #[default]
    Tracing,
    Metrics,
    Silent,
}

impl Observability {
    fn context_hooks(self) -> Arc<dyn ContextBuildHooks> {
        match self {
            Self::Tracing => Arc::new(SafeContextHooks::new(TracingObservabilityHooks)),
            Self::Metrics => Arc::new(SafeContextHooks::new(MetricsObservabilityHooks)),
            Self::Silent => Arc::new(NoopContextBuildHooks),
        }
    }

    fn stream_hooks(self) -> Arc<dyn StreamHooks> {
        match self {
            Self::Tracing => Arc::new(SafeStreamHooks::new(TracingObservabilityHooks)),
            Self::Metrics => Arc::new(SafeStreamHooks::new(MetricsObservabilityHooks)),
            Self::Silent => Arc::new(NoopStreamHooks),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeOptions {
    pub resolver: ResolverConfig,
    pub context: ContextBuilderOptions,
    pub observability: Observability,
}

pub fn context_builder(options: RuntimeOptions) -> RequestContextBuilder {
    RequestContextBuilder::new(Arc::new(FileSystemResourceResolver::new(options.resolver)))
        .with_options(options.context)
        .with_hooks(options.observability.context_hooks())
}

pub fn chat_service(
    registry: &ClientRegistry,
    provider: ProviderId,
) -> Result<ChatService, ChatError> {
    chat_service_with(registry, provider, RuntimeOptions::default())
}

pub fn chat_service_with(
    registry: &ClientRegistry,
    provider: ProviderId,
    options: RuntimeOptions,
) -> Result<ChatService, ChatError> {
    if !registry.contains(provider) {
        return Err(ChatError::not_configured(format!(
            "no client registered for provider '{provider}'"
        )));
    }

    ChatService::builder()
        .clients_from_registry(registry, provider)
        .context_builder(context_builder(options))
        .stream_hooks(options.observability.stream_hooks())
        .build()
}
