//! Streaming reassembly: an ordered run of [`StreamingPart`]s in, one assistant [`Message`] out.
//!
//! [`StreamReassembler`] is the pure state machine. [`ReassemblyDriver`] pulls parts from a provider
//! stream, feeds the machine, and reports to [`StreamHooks`]. [`reassemble`] drives a stream to the end.
//!
//! ```rust
//! use cchat::StreamReassembler;
//! use cprovider::{ContentPart, FinishReason, StreamingPart};
//!
//! let mut reassembler = StreamReassembler::new();
//! assert!(reassembler.apply(&StreamingPart::text("Hello, ")).unwrap().is_none());
//! assert!(reassembler.apply(&StreamingPart::text("world!")).unwrap().is_none());
//!
//! let done = reassembler
//!     .apply(&StreamingPart::end("stop"))
//!     .unwrap()
//!     .expect("stream end yields a message");
//! assert_eq!(done.finish_reason, FinishReason::Stop);
//! assert_eq!(done.message.parts(), &[ContentPart::text("Hello, world!")]);
//! ```

use std::collections::HashMap;
use std::time::Instant;

use ccommon::{CancellationToken, cancellable};
use cprovider::{
    BoxedPartStream, ContentPart, FinishReason, Message, Role, StreamingPart, ToolCallRequest,
};
use futures_util::StreamExt;

use crate::{StreamError, StreamHooks};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReassemblerState {
    #[default]
    Accumulating,
    Completed(FinishReason),
    /// A protocol violation or stream failure was observed. Nothing further is accepted.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledMessage {
    pub message: Message,
    pub finish_reason: FinishReason,
}

/// One accumulation state per in-flight stream. Not shared between streams.
#[derive(Debug, Default)]
pub struct StreamReassembler {
    state: ReassemblerState,
    text: String,
    tool_calls: Vec<ToolCallRequest>,
    slots: HashMap<String, usize>,
}

impl StreamReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReassemblerState {
        &self.state
    }

    pub fn is_accumulating(&self) -> bool {
        self.state == ReassemblerState::Accumulating
    }

    pub fn open_tool_calls(&self) -> usize {
        self.tool_calls.len()
    }

    /// Feeds one part. Returns the finished message when `part` is `StreamEnd`.
    pub fn apply(
        &mut self,
        part: &StreamingPart,
    ) -> Result<Option<ReassembledMessage>, StreamError> {
        if !self.is_accumulating() {
            return Err(StreamError::already_terminated());
        }

        let outcome = self.transition(part);
        if outcome.is_err() {
            self.abort();
        }

        outcome
    }

    /// Drops all buffered output and refuses further input.
    pub fn abort(&mut self) {
        self.text.clear();
        self.tool_calls.clear();
        self.slots.clear();
        self.state = ReassemblerState::Failed;
    }

    fn transition(
        &mut self,
        part: &StreamingPart,
    ) -> Result<Option<ReassembledMessage>, StreamError> {
        match part {
            StreamingPart::TextDelta(delta) => {
                self.text.push_str(delta);
                Ok(None)
            }
            StreamingPart::ToolCallStart {
                tool_call_id,
                function_name,
            } => {
                if self.slots.contains_key(tool_call_id) {
                    return Err(StreamError::duplicate_tool_call_id(tool_call_id));
                }

                self.slots
                    .insert(tool_call_id.clone(), self.tool_calls.len());
                self.tool_calls.push(ToolCallRequest::new(
                    tool_call_id.as_str(),
                    function_name.as_str(),
                    String::new(),
                ));
                Ok(None)
            }
            StreamingPart::ToolCallArgumentDelta {
                tool_call_id,
                chunk,
            } => {
                let Some(&slot) = self.slots.get(tool_call_id) else {
                    return Err(StreamError::unknown_tool_call_id(tool_call_id));
                };

                self.tool_calls[slot].arguments_json.push_str(chunk);
                Ok(None)
            }
            StreamingPart::StreamEnd(reason) => Ok(Some(self.finish(reason.clone()))),
        }
    }

    fn finish(&mut self, finish_reason: FinishReason) -> ReassembledMessage {
        let mut parts = Vec::with_capacity(self.tool_calls.len() + 1);

        let text = std::mem::take(&mut self.text);
        if !text.is_empty() {
            parts.push(ContentPart::Text(text));
        }

        // First-start order; arguments are left unparsed.
        parts.extend(
            std::mem::take(&mut self.tool_calls)
                .into_iter()
                .map(|call| ContentPart::ToolCall(vec![call])),
        );
        self.slots.clear();
        self.state = ReassemblerState::Completed(finish_reason.clone());

        ReassembledMessage {
            message: Message::new(Role::Assistant, parts),
            finish_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyStep {
    /// A part was consumed and applied.
    Part(StreamingPart),
    /// The stream ended cleanly after `StreamEnd`.
    Complete(ReassembledMessage),
}

/// Pulls parts from a provider stream in order and feeds a [`StreamReassembler`].
pub struct ReassemblyDriver<'a> {
    stream: BoxedPartStream<'a>,
    reassembler: StreamReassembler,
    hooks: &'a dyn StreamHooks,
    started: Instant,
    finished: Option<ReassembledMessage>,
}

impl<'a> ReassemblyDriver<'a> {
    pub fn new(stream: BoxedPartStream<'a>, hooks: &'a dyn StreamHooks) -> Self {
        Self {
            stream,
            reassembler: StreamReassembler::new(),
            hooks,
            started: Instant::now(),
            finished: None,
        }
    }

    pub fn state(&self) -> &ReassemblerState {
        self.reassembler.state()
    }

    pub async fn next_step(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReassemblyStep, StreamError> {
        if let Some(done) = self.finished.take() {
            return Ok(ReassemblyStep::Complete(done));
        }

        let outcome = self.advance(cancel).await;
        if let Err(error) = &outcome {
            if error.is_cancelled() {
                self.hooks.on_stream_cancelled(self.started.elapsed());
            } else {
                if self.reassembler.is_accumulating() {
                    self.reassembler.abort();
                }
                self.hooks
                    .on_stream_failed(error, self.started.elapsed());
            }
        }

        outcome
    }

    async fn advance(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReassemblyStep, StreamError> {
        if !self.reassembler.is_accumulating() {
            return Err(StreamError::already_terminated());
        }

        let part = match cancellable(cancel, self.stream.next()).await? {
            Some(item) => item?,
            None => return Err(StreamError::truncated()),
        };
        self.hooks.on_part_received(&part);

        // Anything after the terminal part fails the whole turn. The reassembler only
        // completes once the stream has closed, so a cancel here leaves it accumulating.
        if part.is_terminal() {
            match cancellable(cancel, self.stream.next()).await? {
                None => {}
                Some(Ok(_)) => return Err(StreamError::already_terminated()),
                Some(Err(error)) => return Err(error.into()),
            }
        }

        if let Some(done) = self.reassembler.apply(&part)? {
            self.hooks.on_stream_completed(
                done.message.id(),
                &done.finish_reason,
                done.message.tool_calls().count(),
                self.started.elapsed(),
            );
            self.finished = Some(done);
        }

        Ok(ReassemblyStep::Part(part))
    }
}

/// Consumes `stream` to completion. Cancellation yields `Cancelled` and no partial message.
pub async fn reassemble<'a>(
    stream: BoxedPartStream<'a>,
    cancel: &CancellationToken,
    hooks: &'a dyn StreamHooks,
) -> Result<ReassembledMessage, StreamError> {
    let mut driver = ReassemblyDriver::new(stream, hooks);
    loop {
        if let ReassemblyStep::Complete(done) = driver.next_step(cancel).await? {
            return Ok(done);
        }
    }
}
