//! Immutable conversation messages.
//!
//! ```rust
//! use cprovider::{ContentPart, Message, Role};
//!
//! let message = Message::new(
//!     Role::User,
//!     vec![ContentPart::text("Hello, "), ContentPart::text("world")],
//! );
//! assert_eq!(message.text_content(), "Hello, world");
//!
//! let trimmed = message.with_parts(vec![ContentPart::text("Hi")]);
//! assert_eq!(trimmed.id(), message.id());
//! assert_eq!(message.text_content(), "Hello, world");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ContentPart, ToolCallRequest, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One turn of a conversation. Never changes after construction.
///
/// Parts sit behind an `Arc` so copies of a message, and of any session holding it, share payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    role: Role,
    created_at: DateTime<Utc>,
    parts: Arc<[ContentPart]>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self::from_parts(Uuid::new_v4(), role, Utc::now(), parts)
    }

    pub fn from_parts(
        id: Uuid,
        role: Role,
        created_at: DateTime<Utc>,
        parts: Vec<ContentPart>,
    ) -> Self {
        Self {
            id,
            role,
            created_at,
            parts: parts.into(),
        }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::new(role, vec![ContentPart::text(text)])
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Tool, vec![ContentPart::tool_result(tool_call_id, content)])
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    /// A copy carrying the same identity with different parts.
    pub fn with_parts(&self, parts: Vec<ContentPart>) -> Self {
        Self::from_parts(self.id, self.role, self.created_at, parts)
    }

    /// Concatenation of every `Text` part, in order.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .concat()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolCall(calls) => Some(calls),
                _ => None,
            })
            .flatten()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for call in self.tool_calls() {
            if !seen.insert(call.id.as_str()) {
                return Err(ValidationError::duplicate_tool_call_id(&call.id));
            }
        }

        Ok(())
    }
}
