//! Chat turns over the client contracts: build context, call the provider, close the turn.
//!
//! A turn never mutates the caller's [`Session`]. The finished [`ChatTurn`] carries the next session
//! version with the assistant message appended.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use ccommon::{CancellationToken, cancellable};
use cprovider::{
    ClientRegistry, CompletionClient, FinishReason, InferenceParameters, Message, ProviderId,
    RequestContext, Role, Session, StreamingClient, StreamingPart,
};
use futures_core::Stream;

use crate::{
    ChatError, ChatErrorKind, NoopStreamHooks, ReassemblyDriver, ReassemblyStep,
    RequestContextBuilder, StreamHooks, reassemble,
};

/// Outcome of one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub message: Message,
    /// `None` for single-shot completions, which do not report one through the contract.
    pub finish_reason: Option<FinishReason>,
    pub session: Session,
}

impl ChatTurn {
    fn close(
        session: &Session,
        message: Message,
        finish_reason: Option<FinishReason>,
    ) -> Result<Self, ChatError> {
        let session = session.append(message.clone())?;
        Ok(Self {
            message,
            finish_reason,
            session,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Part(StreamingPart),
    TurnComplete(ChatTurn),
}

pub type ChatEventStream<'a> = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send + 'a>>;

#[derive(Clone)]
pub struct ChatService {
    completion: Option<Arc<dyn CompletionClient>>,
    streaming: Option<Arc<dyn StreamingClient>>,
    context_builder: RequestContextBuilder,
    stream_hooks: Arc<dyn StreamHooks>,
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    pub fn context_builder(&self) -> &RequestContextBuilder {
        &self.context_builder
    }

    pub fn supports_completion(&self) -> bool {
        self.completion.is_some()
    }

    pub fn supports_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Single-shot turn. The client builds its own context from the raw session.
    pub async fn complete_turn(
        &self,
        session: &Session,
        parameters: &InferenceParameters,
        cancel: &CancellationToken,
    ) -> Result<ChatTurn, ChatError> {
        let client = self
            .completion
            .as_ref()
            .ok_or_else(|| ChatError::not_configured("no completion client configured"))?;
        parameters.validate()?;

        if cancel.is_cancelled() {
            return Err(ChatError::cancelled());
        }

        let message = cancellable(cancel, client.get_completion(session, parameters, cancel)).await??;
        if message.role() != Role::Assistant {
            return Err(ChatError::new(
                ChatErrorKind::Provider,
                format!(
                    "completion client returned a {:?} message, expected Assistant",
                    message.role()
                ),
            ));
        }

        ChatTurn::close(session, message, None)
    }

    /// Builds the request context a streaming turn would send.
    pub async fn build_context(
        &self,
        session: &Session,
        parameters: &InferenceParameters,
        cancel: &CancellationToken,
    ) -> Result<RequestContext, ChatError> {
        parameters.validate()?;
        Ok(self.context_builder.build(session, parameters, cancel).await?)
    }

    pub async fn stream_turn(
        &self,
        session: &Session,
        parameters: &InferenceParameters,
        cancel: &CancellationToken,
    ) -> Result<ChatTurn, ChatError> {
        let client = self.streaming_client()?;
        let context = self.build_context(session, parameters, cancel).await?;

        let parts =
            cancellable(cancel, client.stream_completion(&context, parameters, cancel)).await??;
        let done = reassemble(parts, cancel, self.stream_hooks.as_ref()).await?;

        ChatTurn::close(session, done.message, Some(done.finish_reason))
    }

    /// Same flow as [`ChatService::stream_turn`], surfacing each part as it is consumed.
    ///
    /// The stream ends after `TurnComplete` or after the first error.
    pub fn stream_turn_events<'a>(
        &'a self,
        session: &'a Session,
        parameters: &'a InferenceParameters,
        cancel: &'a CancellationToken,
    ) -> ChatEventStream<'a> {
        let stream = try_stream! {
            let client = self.streaming_client()?;
            let context = self.build_context(session, parameters, cancel).await?;

            let parts = cancellable(cancel, client.stream_completion(&context, parameters, cancel))
                .await
                .map_err(ChatError::from)?
                .map_err(ChatError::from)?;
            let mut driver = ReassemblyDriver::new(parts, self.stream_hooks.as_ref());

            loop {
                match driver.next_step(cancel).await.map_err(ChatError::from)? {
                    ReassemblyStep::Part(part) => {
                        yield ChatEvent::Part(part);
                    }
                    ReassemblyStep::Complete(done) => {
                        let turn = ChatTurn::close(session, done.message, Some(done.finish_reason))?;
                        yield ChatEvent::TurnComplete(turn);
                        break;
                    }
                }
            }
        };

        Box::pin(stream) as ChatEventStream<'a>
    }

    fn streaming_client(&self) -> Result<&Arc<dyn StreamingClient>, ChatError> {
        self.streaming
            .as_ref()
            .ok_or_else(|| ChatError::not_configured("no streaming client configured"))
    }
}

#[derive(Clone, Default)]
pub struct ChatServiceBuilder {
    completion: Option<Arc<dyn CompletionClient>>,
    streaming: Option<Arc<dyn StreamingClient>>,
    context_builder: Option<RequestContextBuilder>,
    stream_hooks: Option<Arc<dyn StreamHooks>>,
}

impl ChatServiceBuilder {
    pub fn completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    pub fn streaming_client(mut self, client: Arc<dyn StreamingClient>) -> Self {
        self.streaming = Some(client);
        self
    }

    /// Takes whichever capabilities `registry` holds for `provider_id`.
    pub fn clients_from_registry(mut self, registry: &ClientRegistry, provider_id: ProviderId) -> Self {
        if let Some(client) = registry.completion(provider_id) {
            self.completion = Some(client);
        }

        if let Some(client) = registry.streaming(provider_id) {
            self.streaming = Some(client);
        }

        self
    }

    pub fn context_builder(mut self, builder: RequestContextBuilder) -> Self {
        self.context_builder = Some(builder);
        self
    }

    pub fn stream_hooks(mut self, hooks: Arc<dyn StreamHooks>) -> Self {
        self.stream_hooks = Some(hooks);
        self
    }

    pub fn build(self) -> Result<ChatService, ChatError> {
        if self.completion.is_none() && self.streaming.is_none() {
            return Err(ChatError::not_configured(
                "chat service needs a completion or streaming client",
            ));
        }

        Ok(ChatService {
            completion: self.completion,
            streaming: self.streaming,
            context_builder: self.context_builder.unwrap_or_default(),
            stream_hooks: self
                .stream_hooks
                .unwrap_or_else(|| Arc::new(NoopStreamHooks)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use cprovider::{
        BoxedPartStream, ContentPart, Modality, ProviderClient, ProviderError, ProviderFuture,
        ResourceRef, VecPartStream,
    };
    use futures_util::StreamExt;

    use super::*;

    struct FakeCompletion {
        reply: Message,
        calls: Mutex<usize>,
    }

    impl FakeCompletion {
        fn replying(reply: Message) -> Self {
            Self {
                reply,
                calls: Mutex::new(0),
            }
        }
    }

    impl ProviderClient for FakeCompletion {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }
    }

    impl CompletionClient for FakeCompletion {
        fn get_completion<'a>(
            &'a self,
            _session: &'a Session,
            _parameters: &'a InferenceParameters,
            _cancel: &'a CancellationToken,
        ) -> ProviderFuture<'a, Result<Message, ProviderError>> {
            Box::pin(async move {
                *self.calls.lock().expect("calls lock") += 1;
                Ok(self.reply.clone())
            })
        }
    }

    struct ScriptedStreaming {
        parts: Vec<Result<StreamingPart, ProviderError>>,
        seen: Mutex<Vec<RequestContext>>,
    }

    impl ScriptedStreaming {
        fn new(parts: Vec<StreamingPart>) -> Self {
            Self {
                parts: parts.into_iter().map(Ok).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<RequestContext> {
            self.seen.lock().expect("seen lock").clone()
        }
    }

    impl ProviderClient for ScriptedStreaming {
        fn id(&self) -> ProviderId {
            ProviderId::Anthropic
        }
    }

    impl StreamingClient for ScriptedStreaming {
        fn stream_completion<'a>(
            &'a self,
            context: &'a RequestContext,
            _parameters: &'a InferenceParameters,
            _cancel: &'a CancellationToken,
        ) -> ProviderFuture<'a, Result<BoxedPartStream<'a>, ProviderError>> {
            Box::pin(async move {
                self.seen.lock().expect("seen lock").push(context.clone());
                Ok(Box::pin(VecPartStream::new(self.parts.clone())) as BoxedPartStream<'a>)
            })
        }
    }

    fn conversation() -> Session {
        Session::new()
            .append(Message::text(Role::System, "You are terse."))
            .and_then(|s| s.append(Message::text(Role::User, "What is 2+2?")))
            .expect("session")
    }

    fn streaming_service(client: Arc<ScriptedStreaming>) -> ChatService {
        ChatService::builder()
            .streaming_client(client)
            .build()
            .expect("service")
    }

    #[tokio::test]
    async fn complete_turn_appends_assistant_reply_to_a_new_session_version() {
        let client = Arc::new(FakeCompletion::replying(Message::text(Role::Assistant, "4")));
        let service = ChatService::builder()
            .completion_client(client.clone())
            .build()
            .expect("service");
        let session = conversation();

        let turn = service
            .complete_turn(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("turn");

        assert_eq!(turn.message.text_content(), "4");
        assert_eq!(turn.finish_reason, None);
        assert_eq!(turn.session.len(), 3);
        assert_eq!(session.len(), 2);
        assert_eq!(*client.calls.lock().expect("calls lock"), 1);
    }

    #[tokio::test]
    async fn complete_turn_rejects_non_assistant_reply() {
        let service = ChatService::builder()
            .completion_client(Arc::new(FakeCompletion::replying(Message::text(
                Role::User,
                "echo",
            ))))
            .build()
            .expect("service");

        let error = service
            .complete_turn(
                &conversation(),
                &InferenceParameters::default(),
                &CancellationToken::new(),
            )
            .await
            .expect_err("wrong role");
        assert_eq!(error.kind, ChatErrorKind::Provider);
    }

    #[tokio::test]
    async fn invalid_parameters_never_reach_the_client() {
        let client = Arc::new(FakeCompletion::replying(Message::text(Role::Assistant, "4")));
        let service = ChatService::builder()
            .completion_client(client.clone())
            .build()
            .expect("service");
        let parameters = InferenceParameters {
            temperature: Some(5.0),
            ..InferenceParameters::default()
        };

        let error = service
            .complete_turn(&conversation(), &parameters, &CancellationToken::new())
            .await
            .expect_err("invalid temperature");

        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert_eq!(*client.calls.lock().expect("calls lock"), 0);
    }

    #[tokio::test]
    async fn missing_capability_is_not_configured() {
        assert_eq!(
            ChatService::builder().build().err().map(|error| error.kind),
            Some(ChatErrorKind::NotConfigured)
        );

        let service = ChatService::builder()
            .completion_client(Arc::new(FakeCompletion::replying(Message::text(
                Role::Assistant,
                "4",
            ))))
            .build()
            .expect("service");
        let error = service
            .stream_turn(
                &conversation(),
                &InferenceParameters::default(),
                &CancellationToken::new(),
            )
            .await
            .expect_err("no streaming client");
        assert_eq!(error.kind, ChatErrorKind::NotConfigured);
    }

    #[tokio::test]
    async fn stream_turn_sends_built_context_and_appends_reassembled_message() {
        let client = Arc::new(ScriptedStreaming::new(vec![
            StreamingPart::text("Four"),
            StreamingPart::text("."),
            StreamingPart::end("end_turn"),
        ]));
        let service = streaming_service(client.clone());
        let session = conversation();
        let parameters = InferenceParameters::builder()
            .system_prompt_override("Be verbose.")
            .build()
            .expect("parameters");

        let turn = service
            .stream_turn(&session, &parameters, &CancellationToken::new())
            .await
            .expect("turn");

        assert_eq!(turn.message.text_content(), "Four.");
        assert_eq!(turn.finish_reason, Some(FinishReason::Stop));
        assert_eq!(turn.session.messages().last(), Some(&turn.message));

        let seen = client.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system_prompt(), Some("Be verbose."));
        assert_eq!(seen[0].messages().len(), 1);
    }

    #[tokio::test]
    async fn protocol_violation_fails_the_turn_without_a_message() {
        let client = Arc::new(ScriptedStreaming::new(vec![
            StreamingPart::tool_call_arguments("ghost", "{}"),
            StreamingPart::end("stop"),
        ]));

        let error = streaming_service(client)
            .stream_turn(
                &conversation(),
                &InferenceParameters::default(),
                &CancellationToken::new(),
            )
            .await
            .expect_err("unknown tool call id");
        assert_eq!(error.kind, ChatErrorKind::Stream);
    }

    #[tokio::test]
    async fn context_failure_stops_before_the_provider_call() {
        let client = Arc::new(ScriptedStreaming::new(vec![StreamingPart::end("stop")]));
        let image = ContentPart::media(
            Modality::Image,
            ResourceRef::local_path("/definitely/not/here/cat.png"),
        )
        .expect("image part");
        let session = conversation()
            .append(Message::new(Role::User, vec![image]))
            .expect("session");

        let error = streaming_service(client.clone())
            .stream_turn(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect_err("missing file");

        assert_eq!(error.kind, ChatErrorKind::Context);
        assert!(client.seen().is_empty());
    }

    #[tokio::test]
    async fn cancelled_turns_report_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = Arc::new(ScriptedStreaming::new(vec![StreamingPart::end("stop")]));

        let error = streaming_service(client)
            .stream_turn(&conversation(), &InferenceParameters::default(), &cancel)
            .await
            .expect_err("cancelled");
        assert!(error.is_cancelled());
    }

    #[tokio::test]
    async fn stream_turn_events_yield_parts_then_turn_complete() {
        let client = Arc::new(ScriptedStreaming::new(vec![
            StreamingPart::tool_call_start("t1", "calculator"),
            StreamingPart::tool_call_arguments("t1", "{\"expr\":\"2+2\"}"),
            StreamingPart::end("tool_use"),
        ]));
        let service = streaming_service(client);
        let session = conversation();
        let parameters = InferenceParameters::default();
        let cancel = CancellationToken::new();

        let events = service
            .stream_turn_events(&session, &parameters, &cancel)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0].as_ref().expect("first event"),
            &ChatEvent::Part(StreamingPart::tool_call_start("t1", "calculator"))
        );
        let Ok(ChatEvent::TurnComplete(turn)) = &events[3] else {
            panic!("expected turn completion, got {:?}", events[3]);
        };
        assert_eq!(turn.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(turn.message.tool_calls().count(), 1);
        assert_eq!(turn.session.len(), 3);
    }

    #[tokio::test]
    async fn stream_turn_events_end_after_first_error() {
        let client = Arc::new(ScriptedStreaming::new(vec![StreamingPart::text("cut off")]));
        let service = streaming_service(client);
        let session = conversation();
        let parameters = InferenceParameters::default();
        let cancel = CancellationToken::new();

        let events = service
            .stream_turn_events(&session, &parameters, &cancel)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert_eq!(
            events[1].as_ref().err().map(|error| error.kind),
            Some(ChatErrorKind::Stream)
        );
    }
}
