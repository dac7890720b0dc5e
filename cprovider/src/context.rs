//! Fully resolved, provider-agnostic request payload.

use serde::{Deserialize, Serialize};

use crate::{Message, ToolDefinition};

/// Everything a provider adapter needs to serialize one request.
///
/// Owns its data; nothing here points back into the session it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    messages: Vec<Message>,
    system_prompt: Option<String>,
    available_tools: Vec<ToolDefinition>,
}

impl RequestContext {
    pub fn new(
        messages: Vec<Message>,
        system_prompt: Option<String>,
        available_tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            messages,
            system_prompt,
            available_tools,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn available_tools(&self) -> &[ToolDefinition] {
        &self.available_tools
    }

    pub fn into_parts(self) -> (Vec<Message>, Option<String>, Vec<ToolDefinition>) {
        (self.messages, self.system_prompt, self.available_tools)
    }
}
