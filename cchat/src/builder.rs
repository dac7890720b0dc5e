//! Request context construction: session log + overrides + resolved resources.
//!
//! The builder reads a [`Session`] and never changes it. The steps run in a fixed order:
//!
//! 1. pick the system prompt (per-call override, else the first system message's text),
//! 2. walk the log in order, skipping the first system message only when a per-call override replaced it,
//! 3. apply each message's context override (exclusion wins over replacement),
//! 4. resolve every media part through the [`ResourceResolver`], concurrently, reassembled by index,
//! 5. copy the tool catalog as-is.
//!
//! ```rust
//! use cchat::RequestContextBuilder;
//! use cprovider::{CancellationToken, InferenceParameters, Message, Role, Session};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let session = Session::new()
//!     .append(Message::text(Role::System, "You are terse."))
//!     .and_then(|s| s.append(Message::text(Role::User, "hi")))
//!     .expect("append");
//!
//! let context = RequestContextBuilder::default()
//!     .build(&session, &InferenceParameters::default(), &CancellationToken::new())
//!     .await
//!     .expect("context should build");
//!
//! assert_eq!(context.system_prompt(), Some("You are terse."));
//! assert_eq!(context.messages().len(), 2);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use ccommon::{CancellationToken, cancellable};
use cprovider::{
    ContentPart, InferenceParameters, MediaPart, Message, RequestContext, Session,
};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use uuid::Uuid;

use crate::{
    ContextBuildHooks, ContextBuildSummary, ContextError, FileSystemResourceResolver,
    NoopContextBuildHooks, ResourceError, ResourceResolver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBuilderOptions {
    pub max_concurrent_resolutions: usize,
}

impl ContextBuilderOptions {
    pub const DEFAULT_MAX_CONCURRENT_RESOLUTIONS: usize = 4;

    pub fn with_max_concurrent_resolutions(mut self, limit: usize) -> Self {
        self.max_concurrent_resolutions = limit.max(1);
        self
    }
}

impl Default for ContextBuilderOptions {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: Self::DEFAULT_MAX_CONCURRENT_RESOLUTIONS,
        }
    }
}

#[derive(Clone)]
pub struct RequestContextBuilder {
    resolver: Arc<dyn ResourceResolver>,
    hooks: Arc<dyn ContextBuildHooks>,
    options: ContextBuilderOptions,
}

impl Default for RequestContextBuilder {
    fn default() -> Self {
        Self::new(Arc::new(FileSystemResourceResolver::default()))
    }
}

impl RequestContextBuilder {
    pub fn new(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self {
            resolver,
            hooks: Arc::new(NoopContextBuildHooks),
            options: ContextBuilderOptions::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ContextBuildHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_options(mut self, options: ContextBuilderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ContextBuilderOptions {
        &self.options
    }

    pub async fn build(
        &self,
        session: &Session,
        parameters: &InferenceParameters,
        cancel: &CancellationToken,
    ) -> Result<RequestContext, ContextError> {
        let started = Instant::now();
        self.hooks.on_build_start(session.id(), session.len());

        match self.assemble(session, parameters, cancel).await {
            Ok((context, summary)) => {
                self.hooks
                    .on_build_success(session.id(), &summary, started.elapsed());
                Ok(context)
            }
            Err(error) if error.is_cancelled() => {
                self.hooks.on_build_cancelled(session.id(), started.elapsed());
                Err(error)
            }
            Err(error) => {
                self.hooks
                    .on_build_failure(session.id(), &error, started.elapsed());
                Err(error)
            }
        }
    }

    async fn assemble(
        &self,
        session: &Session,
        parameters: &InferenceParameters,
        cancel: &CancellationToken,
    ) -> Result<(RequestContext, ContextBuildSummary), ContextError> {
        if cancel.is_cancelled() {
            return Err(ContextError::cancelled());
        }

        let mut summary = ContextBuildSummary::default();
        let SystemPrompt { prompt, superseded } = select_system_prompt(session, parameters);

        let mut messages = Vec::with_capacity(session.len());
        for message in session.messages() {
            if superseded == Some(message.id()) {
                continue;
            }

            let Some(context_override) = session.override_for(message.id()) else {
                messages.push(message.clone());
                continue;
            };

            match context_override.apply(message) {
                Some(view) => {
                    if context_override.alternate_parts.is_some() {
                        summary.replaced_messages += 1;
                    }
                    messages.push(view);
                }
                None => {
                    summary.excluded_messages += 1;
                    self.hooks.on_message_excluded(session.id(), message.id());
                }
            }
        }

        let (messages, resolved) = self.resolve_media(session.id(), messages, cancel).await?;

        summary.retained_messages = messages.len();
        summary.resolved_resources = resolved;
        summary.has_system_prompt = prompt.is_some();
        summary.tool_count = session.available_tools().len();

        let tools = session.available_tools().as_slice().to_vec();
        Ok((RequestContext::new(messages, prompt, tools), summary))
    }

    async fn resolve_media(
        &self,
        session_id: Uuid,
        mut messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Message>, usize), ContextError> {
        let jobs = messages
            .iter()
            .enumerate()
            .flat_map(|(message_index, message)| {
                message
                    .parts()
                    .iter()
                    .enumerate()
                    .filter_map(move |(part_index, part)| match part {
                        ContentPart::Media(media) => Some(MediaJob {
                            message_index,
                            part_index,
                            message_id: message.id(),
                            media: media.clone(),
                            resolved: false,
                        }),
                        _ => None,
                    })
            })
            .collect::<Vec<_>>();

        if jobs.is_empty() {
            return Ok((messages, 0));
        }

        let resolver = self.resolver.as_ref();
        let hooks = self.hooks.as_ref();
        let resolutions = stream::iter(jobs)
            .map(move |job| async move {
                let started = Instant::now();
                let source = job.media.resource().kind;
                let resource = resolver
                    .resolve(job.media.resource().clone(), cancel)
                    .await?;

                // Pass-through references were not resolved and are not reported.
                let resolved = &resource != job.media.resource();
                if resolved {
                    hooks.on_resource_resolved(
                        session_id,
                        job.message_id,
                        source,
                        resource.length_bytes,
                        started.elapsed(),
                    );
                }

                Ok::<_, ResourceError>(MediaJob {
                    media: job.media.with_resource(resource),
                    resolved,
                    ..job
                })
            })
            .buffer_unordered(self.options.max_concurrent_resolutions.max(1))
            .try_collect::<Vec<_>>();

        // Completion order is irrelevant; parts go back by index.
        let resolved = cancellable(cancel, resolutions).await??;
        let count = resolved.iter().filter(|job| job.resolved).count();

        let mut by_message = BTreeMap::<usize, Vec<MediaJob>>::new();
        for job in resolved {
            by_message.entry(job.message_index).or_default().push(job);
        }

        for (message_index, jobs) in by_message {
            let message = &messages[message_index];
            let mut parts = message.parts().to_vec();
            for job in jobs {
                parts[job.part_index] = ContentPart::Media(job.media);
            }
            messages[message_index] = message.with_parts(parts);
        }

        Ok((messages, count))
    }
}

struct MediaJob {
    message_index: usize,
    part_index: usize,
    message_id: Uuid,
    media: MediaPart,
    resolved: bool,
}

struct SystemPrompt {
    prompt: Option<String>,
    superseded: Option<Uuid>,
}

/// With a per-call override the override is the prompt and the first system message is dropped from
/// the list. Without one, the first system message supplies the prompt (after its own context override)
/// and stays inline for providers that expect it there.
fn select_system_prompt(session: &Session, parameters: &InferenceParameters) -> SystemPrompt {
    let first_system = session.first_system_message();

    if let Some(prompt) = &parameters.system_prompt_override {
        return SystemPrompt {
            prompt: Some(prompt.clone()),
            superseded: first_system.map(Message::id),
        };
    }

    let prompt = first_system
        .and_then(|message| match session.override_for(message.id()) {
            Some(context_override) => context_override.apply(message),
            None => Some(message.clone()),
        })
        .map(|message| message.text_content())
        .filter(|text| !text.is_empty());

    SystemPrompt {
        prompt,
        superseded: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use ccommon::BoxFuture;
    use cprovider::{Modality, ResourceKind, ResourceRef, Role, ToolCatalog, ToolDefinition};

    use super::*;
    use crate::{ContextErrorKind, ResourceErrorKind};

    /// Resolves `LocalPath` values from a fixed table after a per-path delay.
    #[derive(Default)]
    struct TableResolver {
        entries: HashMap<String, (String, u64)>,
        failures: HashMap<String, ResourceErrorKind>,
        calls: Mutex<Vec<String>>,
    }

    impl TableResolver {
        fn with_entry(mut self, path: &str, payload: &str, delay_ms: u64) -> Self {
            self.entries
                .insert(path.to_string(), (payload.to_string(), delay_ms));
            self
        }

        fn with_failure(mut self, path: &str, kind: ResourceErrorKind) -> Self {
            self.failures.insert(path.to_string(), kind);
            self
        }
    }

    impl ResourceResolver for TableResolver {
        fn resolve<'a>(
            &'a self,
            resource: ResourceRef,
            cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<ResourceRef, ResourceError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .expect("calls lock")
                    .push(resource.value.clone());

                if resource.kind != ResourceKind::LocalPath {
                    return Ok(resource);
                }

                if let Some(kind) = self.failures.get(&resource.value) {
                    return Err(ResourceError::new(*kind, "table failure"));
                }

                let (payload, delay_ms) = self
                    .entries
                    .get(&resource.value)
                    .cloned()
                    .ok_or_else(|| ResourceError::not_found("no table entry"))?;

                cancellable(cancel, tokio::time::sleep(Duration::from_millis(delay_ms))).await?;
                Ok(ResourceRef::inline_base64(payload))
            })
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ContextBuildHooks for RecordingHooks {
        fn on_build_start(&self, _session_id: Uuid, message_count: usize) {
            self.push(format!("start:{message_count}"));
        }

        fn on_message_excluded(&self, _session_id: Uuid, _message_id: Uuid) {
            self.push("excluded".to_string());
        }

        fn on_build_success(
            &self,
            _session_id: Uuid,
            summary: &ContextBuildSummary,
            _elapsed: Duration,
        ) {
            self.push(format!(
                "success:{}:{}",
                summary.retained_messages, summary.resolved_resources
            ));
        }

        fn on_build_failure(&self, _session_id: Uuid, error: &ContextError, _elapsed: Duration) {
            self.push(format!("failure:{:?}", error.kind));
        }

        fn on_build_cancelled(&self, _session_id: Uuid, _elapsed: Duration) {
            self.push("cancelled".to_string());
        }
    }

    impl RecordingHooks {
        fn push(&self, event: String) {
            self.events.lock().expect("events lock").push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().expect("events lock").clone()
        }
    }

    fn image(path: &str) -> ContentPart {
        ContentPart::media(Modality::Image, ResourceRef::local_path(path)).expect("image part")
    }

    fn session_of(messages: Vec<Message>) -> Session {
        Session::new().append_all(messages).expect("append")
    }

    async fn build(session: &Session, parameters: &InferenceParameters) -> RequestContext {
        RequestContextBuilder::default()
            .build(session, parameters, &CancellationToken::new())
            .await
            .expect("context should build")
    }

    #[tokio::test]
    async fn system_prompt_override_supersedes_inline_system_message() {
        let system = Message::text(Role::System, "You are terse.");
        let user = Message::text(Role::User, "Explain monads.");
        let session = session_of(vec![system.clone(), user.clone()]);
        let parameters = InferenceParameters::builder()
            .system_prompt_override("Be verbose.")
            .build()
            .expect("parameters");

        let context = build(&session, &parameters).await;

        assert_eq!(context.system_prompt(), Some("Be verbose."));
        assert_eq!(context.messages(), &[user]);
        assert!(
            context
                .messages()
                .iter()
                .all(|message| message.text_content() != "You are terse.")
        );
    }

    #[tokio::test]
    async fn system_message_is_kept_inline_without_override() {
        let system = Message::new(
            Role::System,
            vec![ContentPart::text("You are "), ContentPart::text("terse.")],
        );
        let session = session_of(vec![system.clone(), Message::text(Role::User, "hi")]);

        let context = build(&session, &InferenceParameters::default()).await;

        assert_eq!(context.system_prompt(), Some("You are terse."));
        assert_eq!(context.messages()[0], system);
        assert_eq!(context.messages().len(), 2);
    }

    #[tokio::test]
    async fn only_first_system_message_is_superseded_by_override() {
        let later_system = Message::text(Role::System, "Use metric units.");
        let session = session_of(vec![
            Message::text(Role::System, "You are terse."),
            Message::text(Role::User, "hi"),
            later_system.clone(),
        ]);
        let parameters = InferenceParameters::builder()
            .system_prompt_override("Be verbose.")
            .build()
            .expect("parameters");

        let context = build(&session, &parameters).await;

        assert_eq!(context.messages().len(), 2);
        assert_eq!(context.messages()[1], later_system);
    }

    #[tokio::test]
    async fn system_prompt_follows_the_system_message_override() {
        let system = Message::text(Role::System, "You are terse.");
        let base = session_of(vec![system.clone(), Message::text(Role::User, "hi")]);

        let excluded = base.exclude_message(system.id()).expect("exclude");
        let context = build(&excluded, &InferenceParameters::default()).await;
        assert_eq!(context.system_prompt(), None);
        assert_eq!(context.messages().len(), 1);

        let replaced = base
            .replace_message_parts(system.id(), vec![ContentPart::text("Be brief.")])
            .expect("replace");
        let context = build(&replaced, &InferenceParameters::default()).await;
        assert_eq!(context.system_prompt(), Some("Be brief."));
        assert_eq!(context.messages()[0].text_content(), "Be brief.");
    }

    #[tokio::test]
    async fn session_without_system_message_has_no_prompt() {
        let session = session_of(vec![Message::text(Role::User, "hi")]);
        let context = build(&session, &InferenceParameters::default()).await;
        assert_eq!(context.system_prompt(), None);
    }

    #[tokio::test]
    async fn excluded_messages_are_dropped_and_replacements_swap_parts() {
        let first = Message::text(Role::User, "first");
        let long = Message::text(Role::Assistant, "a very long answer");
        let last = Message::text(Role::User, "last");
        let session = session_of(vec![first.clone(), long.clone(), last.clone()])
            .exclude_message(first.id())
            .and_then(|s| s.replace_message_parts(long.id(), vec![ContentPart::text("summary")]))
            .expect("overrides");

        let context = build(&session, &InferenceParameters::default()).await;

        let ids = context
            .messages()
            .iter()
            .map(Message::id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![long.id(), last.id()]);
        assert_eq!(context.messages()[0].parts(), &[ContentPart::text("summary")]);
    }

    #[tokio::test]
    async fn exclusion_wins_over_alternate_parts() {
        let message = Message::text(Role::User, "secret");
        let session = session_of(vec![message.clone()])
            .with_override(
                message.id(),
                cprovider::MessageContextOverride {
                    is_excluded: true,
                    alternate_parts: Some(vec![ContentPart::text("redacted")]),
                },
            )
            .expect("override");

        let context = build(&session, &InferenceParameters::default()).await;
        assert!(context.messages().is_empty());
    }

    #[tokio::test]
    async fn building_never_mutates_the_session() {
        let message = Message::new(Role::User, vec![ContentPart::text("look"), image("cat.png")]);
        let session = session_of(vec![message.clone()])
            .replace_message_parts(message.id(), vec![image("dog.png")])
            .expect("override");
        let before = session.clone();

        let resolver = TableResolver::default().with_entry("dog.png", "ZG9n", 0);
        let context = RequestContextBuilder::new(Arc::new(resolver))
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("build");

        assert_eq!(session, before);
        assert_eq!(session.messages()[0], message);
        assert_ne!(context.messages()[0], message);
    }

    #[tokio::test]
    async fn media_resolution_is_reassembled_by_index_not_completion_order() {
        let message = Message::new(
            Role::User,
            vec![
                image("slow.png"),
                ContentPart::text("between"),
                image("fast.png"),
            ],
        );
        let later = Message::new(Role::User, vec![image("medium.png")]);
        let session = session_of(vec![message.clone(), later.clone()]);

        let resolver = TableResolver::default()
            .with_entry("slow.png", "c2xvdw==", 40)
            .with_entry("fast.png", "ZmFzdA==", 0)
            .with_entry("medium.png", "bWVk", 10);
        let hooks = Arc::new(RecordingHooks::default());
        let context = RequestContextBuilder::new(Arc::new(resolver))
            .with_hooks(hooks.clone())
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("build");

        let payloads = context
            .messages()
            .iter()
            .flat_map(|message| message.parts())
            .filter_map(|part| match part {
                ContentPart::Media(media) => Some(media.resource().value.clone()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(payloads, vec!["c2xvdw==", "ZmFzdA==", "bWVk"]);
        assert_eq!(context.messages()[0].id(), message.id());
        assert_eq!(context.messages()[0].parts()[1], ContentPart::text("between"));
        assert_eq!(context.messages()[1].id(), later.id());
        assert_eq!(hooks.events(), vec!["start:2", "success:2:3"]);
    }

    #[tokio::test]
    async fn every_media_part_goes_through_the_resolver() {
        let remote = ContentPart::media(
            Modality::Document,
            ResourceRef::remote_url("https://example.test/a.pdf"),
        )
        .expect("document");
        let session = session_of(vec![Message::new(Role::User, vec![remote.clone()])]);
        let resolver = Arc::new(TableResolver::default());
        let hooks = Arc::new(RecordingHooks::default());

        let context = RequestContextBuilder::new(resolver.clone())
            .with_hooks(hooks.clone())
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("build");

        assert_eq!(context.messages()[0].parts(), &[remote]);
        assert_eq!(
            resolver.calls.lock().expect("calls lock").as_slice(),
            &["https://example.test/a.pdf".to_string()]
        );
        assert_eq!(hooks.events(), vec!["start:1", "success:1:0"]);
    }

    #[tokio::test]
    async fn only_rewritten_references_count_as_resolved() {
        let remote = ContentPart::media(
            Modality::Image,
            ResourceRef::remote_url("https://example.test/b.png"),
        )
        .expect("remote image");
        let session = session_of(vec![Message::new(
            Role::User,
            vec![remote, image("local.png")],
        )]);
        let resolver = TableResolver::default().with_entry("local.png", "bG9jYWw=", 0);
        let hooks = Arc::new(RecordingHooks::default());

        RequestContextBuilder::new(Arc::new(resolver))
            .with_hooks(hooks.clone())
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("build");

        assert_eq!(hooks.events(), vec!["start:1", "success:1:1"]);
    }

    #[tokio::test]
    async fn excluded_messages_are_never_resolved() {
        let hidden = Message::new(Role::User, vec![image("missing.png")]);
        let session = session_of(vec![hidden.clone(), Message::text(Role::User, "hi")])
            .exclude_message(hidden.id())
            .expect("exclude");
        let resolver = Arc::new(TableResolver::default());

        let context = RequestContextBuilder::new(resolver.clone())
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect("excluded media must not fail the build");

        assert_eq!(context.messages().len(), 1);
        assert!(resolver.calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn single_resolution_failure_fails_the_whole_build() {
        let session = session_of(vec![Message::new(
            Role::User,
            vec![image("ok.png"), image("denied.png")],
        )]);
        let resolver = TableResolver::default()
            .with_entry("ok.png", "b2s=", 0)
            .with_failure("denied.png", ResourceErrorKind::AccessDenied);
        let hooks = Arc::new(RecordingHooks::default());

        let error = RequestContextBuilder::new(Arc::new(resolver))
            .with_hooks(hooks.clone())
            .build(&session, &InferenceParameters::default(), &CancellationToken::new())
            .await
            .expect_err("build must fail");

        assert_eq!(error.kind, ContextErrorKind::BuildFailed);
        assert_eq!(
            error.resource.as_ref().map(|resource| resource.kind),
            Some(ResourceErrorKind::AccessDenied)
        );
        assert_eq!(hooks.events(), vec!["start:1", "failure:BuildFailed"]);
    }

    #[tokio::test]
    async fn cancellation_is_reported_as_cancellation_not_failure() {
        let session = session_of(vec![Message::new(Role::User, vec![image("slow.png")])]);
        let resolver = TableResolver::default().with_entry("slow.png", "c2xvdw==", 5_000);
        let hooks = Arc::new(RecordingHooks::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let error = RequestContextBuilder::new(Arc::new(resolver))
            .with_hooks(hooks.clone())
            .build(&session, &InferenceParameters::default(), &cancel)
            .await
            .expect_err("cancelled build must not succeed");

        assert!(error.is_cancelled());
        assert_eq!(hooks.events(), vec!["start:1", "cancelled"]);
    }

    #[tokio::test]
    async fn tool_catalog_is_copied_unfiltered() {
        let tools = ToolCatalog::from_tools(vec![
            ToolDefinition::new("lookup", "Look up", "{}"),
            ToolDefinition::new("fetch", "Fetch", "{}"),
        ])
        .expect("catalog");
        let session = session_of(vec![Message::text(Role::User, "hi")]).with_tools(tools);
        let parameters = InferenceParameters::builder()
            .tool_choice(cprovider::ToolChoice::function("fetch").expect("choice"))
            .build()
            .expect("parameters");

        let context = build(&session, &parameters).await;

        let names = context
            .available_tools()
            .iter()
            .map(|tool| tool.function_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["lookup", "fetch"]);
    }

    #[tokio::test]
    async fn context_is_independent_of_later_session_versions() {
        let session = session_of(vec![Message::text(Role::User, "one")]);
        let context = build(&session, &InferenceParameters::default()).await;

        let next = session
            .append(Message::text(Role::Assistant, "two"))
            .and_then(|s| s.exclude_message(s.messages()[0].id()))
            .expect("next version");

        assert_eq!(next.len(), 2);
        assert_eq!(context.messages().len(), 1);
        assert_eq!(context.messages()[0].text_content(), "one");
    }
}
