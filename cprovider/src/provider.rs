//! Capability contracts implemented by provider adapters.
//!
//! The single-shot contract takes a raw [`Session`] and builds its own context; the streaming contract
//! takes a prebuilt [`RequestContext`] so one context can feed several provider calls.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use ccommon::CancellationToken;

use crate::{BoxedPartStream, InferenceParameters, Message, ProviderError, RequestContext, Session};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    XAi,
}

impl ProviderId {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open-ai" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "google" | "gemini" => Some(Self::Google),
            "xai" | "x-ai" | "grok" => Some(Self::XAi),
            _ => None,
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::XAi => "xai",
        };

        f.write_str(id)
    }
}

pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;
}

pub trait CompletionClient: ProviderClient {
    /// Returns exactly one assistant message.
    fn get_completion<'a>(
        &'a self,
        session: &'a Session,
        parameters: &'a InferenceParameters,
        cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<Message, ProviderError>>;
}

pub trait StreamingClient: ProviderClient {
    /// Returns a lazy, finite part stream. A retry requires a new call.
    fn stream_completion<'a>(
        &'a self,
        context: &'a RequestContext,
        parameters: &'a InferenceParameters,
        cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<BoxedPartStream<'a>, ProviderError>>;
}
