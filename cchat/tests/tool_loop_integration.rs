use std::io::Write;
use std::sync::{Arc, Mutex};

use cchat::prelude::*;
use cprovider::{
    BoxedPartStream, ClientRegistry, CompletionClient, ContentPart, InferenceParameters, Message,
    Modality, ProviderClient, ProviderError, ProviderFuture, ProviderId, RequestContext,
    ResourceKind, ResourceRef, Role, Session, StreamingClient, StreamingPart, VecPartStream,
};
use futures_util::StreamExt;

/// Asks for the `echo` tool until a tool result is in context, then answers.
#[derive(Default)]
struct ToolLoopProvider {
    contexts: Mutex<Vec<RequestContext>>,
}

impl ProviderClient for ToolLoopProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }
}

impl CompletionClient for ToolLoopProvider {
    fn get_completion<'a>(
        &'a self,
        session: &'a Session,
        _parameters: &'a InferenceParameters,
        _cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<Message, ProviderError>> {
        Box::pin(async move {
            Ok(Message::text(
                Role::Assistant,
                format!("seen {} messages", session.len()),
            ))
        })
    }
}

impl StreamingClient for ToolLoopProvider {
    fn stream_completion<'a>(
        &'a self,
        context: &'a RequestContext,
        _parameters: &'a InferenceParameters,
        _cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<BoxedPartStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.contexts
                .lock()
                .expect("contexts lock")
                .push(context.clone());

            let answered = context
                .messages()
                .last()
                .is_some_and(|message| message.role() == Role::Tool);

            let parts = if answered {
                vec![
                    StreamingPart::text("The echo said "),
                    StreamingPart::text("hello."),
                    StreamingPart::end("stop"),
                ]
            } else {
                vec![
                    StreamingPart::tool_call_start("tool_call_1", "echo"),
                    StreamingPart::tool_call_arguments("tool_call_1", "{\"text\":"),
                    StreamingPart::tool_call_arguments("tool_call_1", "\"hello\"}"),
                    StreamingPart::end("tool_calls"),
                ]
            };

            Ok(Box::pin(VecPartStream::from_parts(parts)) as BoxedPartStream<'a>)
        })
    }
}

fn service_for(provider: ToolLoopProvider) -> (ChatService, Arc<ToolLoopProvider>) {
    let provider = Arc::new(provider);
    let mut registry = ClientRegistry::new();
    registry.register_streaming(SharedProvider(provider.clone()));
    registry.register_completion(SharedProvider(provider.clone()));

    let service = ChatService::builder()
        .clients_from_registry(&registry, ProviderId::Google)
        .build()
        .expect("service should build");
    (service, provider)
}

/// Lets the test keep a handle on the provider the registry owns.
struct SharedProvider(Arc<ToolLoopProvider>);

impl ProviderClient for SharedProvider {
    fn id(&self) -> ProviderId {
        self.0.id()
    }
}

impl CompletionClient for SharedProvider {
    fn get_completion<'a>(
        &'a self,
        session: &'a Session,
        parameters: &'a InferenceParameters,
        cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<Message, ProviderError>> {
        self.0.get_completion(session, parameters, cancel)
    }
}

impl StreamingClient for SharedProvider {
    fn stream_completion<'a>(
        &'a self,
        context: &'a RequestContext,
        parameters: &'a InferenceParameters,
        cancel: &'a CancellationToken,
    ) -> ProviderFuture<'a, Result<BoxedPartStream<'a>, ProviderError>> {
        self.0.stream_completion(context, parameters, cancel)
    }
}

#[tokio::test]
async fn streamed_tool_call_round_trip_closes_the_loop() {
    let (service, provider) = service_for(ToolLoopProvider::default());
    let parameters = InferenceParameters::default();
    let cancel = CancellationToken::new();

    let session = Session::new()
        .append(Message::text(Role::System, "Use tools when asked."))
        .and_then(|s| s.append(Message::text(Role::User, "Echo hello")))
        .expect("session");

    let first = service
        .stream_turn(&session, &parameters, &cancel)
        .await
        .expect("first turn");
    assert_eq!(first.finish_reason, Some(cprovider::FinishReason::ToolCalls));

    let call = first.message.tool_calls().next().expect("tool call").clone();
    assert_eq!(call.function_name, "echo");
    let arguments = call.parse_arguments().expect("arguments are JSON");
    assert_eq!(arguments["text"], "hello");

    let with_result = first
        .session
        .append(Message::tool_result(&call.id, "hello"))
        .expect("tool result");

    let second = service
        .stream_turn(&with_result, &parameters, &cancel)
        .await
        .expect("second turn");
    assert_eq!(second.message.text_content(), "The echo said hello.");
    assert_eq!(second.session.len(), 5);
    assert_eq!(session.len(), 2);

    let contexts = provider.contexts.lock().expect("contexts lock");
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[1].system_prompt(), Some("Use tools when asked."));
    assert_eq!(contexts[1].messages().len(), 4);
}

#[tokio::test]
async fn local_media_is_inlined_before_the_provider_sees_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("chart.png");
    std::fs::File::create(&path)
        .and_then(|mut file| file.write_all(b"png bytes"))
        .expect("fixture");

    let (service, provider) = service_for(ToolLoopProvider::default());
    let image = ContentPart::media(
        Modality::Image,
        ResourceRef::local_path(path.to_string_lossy()),
    )
    .expect("image");
    let session = Session::new()
        .append(Message::new(
            Role::User,
            vec![ContentPart::text("Describe this"), image.clone()],
        ))
        .expect("session");

    let turn = service
        .stream_turn(&session, &InferenceParameters::default(), &CancellationToken::new())
        .await
        .expect("turn");

    // The stored log keeps the local reference.
    assert_eq!(turn.session.messages()[0].parts()[1], image);

    let contexts = provider.contexts.lock().expect("contexts lock");
    let ContentPart::Media(sent) = &contexts[0].messages()[0].parts()[1] else {
        panic!("expected a media part");
    };
    assert_eq!(sent.resource().kind, ResourceKind::InlineBase64);
    assert_eq!(sent.resource().mime_type.as_deref(), Some("image/png"));
    assert_eq!(sent.resource().length_bytes, Some(9));
}

#[tokio::test]
async fn excluded_history_is_left_out_of_the_request() {
    let (service, provider) = service_for(ToolLoopProvider::default());
    let noisy = Message::text(Role::User, "a very long paste");
    let session = Session::new()
        .append(noisy.clone())
        .and_then(|s| s.append(Message::text(Role::User, "Echo hello")))
        .and_then(|s| s.exclude_message(noisy.id()))
        .expect("session");

    let events = service
        .stream_turn_events(&session, &InferenceParameters::default(), &CancellationToken::new())
        .collect::<Vec<_>>()
        .await;
    assert!(events.iter().all(Result::is_ok));
    assert!(matches!(
        events.last(),
        Some(Ok(ChatEvent::TurnComplete(_)))
    ));

    let contexts = provider.contexts.lock().expect("contexts lock");
    assert!(
        contexts[0]
            .messages()
            .iter()
            .all(|message| message.id() != noisy.id())
    );
}

#[tokio::test]
async fn single_shot_turn_uses_the_completion_capability() {
    let (service, provider) = service_for(ToolLoopProvider::default());
    let session = Session::new()
        .append(Message::text(Role::User, "hi"))
        .expect("session");

    let turn = service
        .complete_turn(&session, &InferenceParameters::default(), &CancellationToken::new())
        .await
        .expect("turn");

    assert_eq!(turn.message.text_content(), "seen 1 messages");
    assert!(provider.contexts.lock().expect("contexts lock").is_empty());
}
